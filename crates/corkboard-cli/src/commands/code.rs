use corkboard_core::models::generate_board_code;

use crate::error::CliError;

pub fn run_code(count: usize) -> Result<(), CliError> {
    for code in generate_codes(count)? {
        println!("{code}");
    }
    Ok(())
}

/// Draw `count` codes. Uniqueness against existing boards is checked when a board is created.
pub fn generate_codes(count: usize) -> Result<Vec<String>, CliError> {
    if count == 0 {
        return Err(CliError::EmptyCodeCount);
    }
    let mut rng = rand::thread_rng();
    Ok((0..count).map(|_| generate_board_code(&mut rng)).collect())
}
