pub mod auth;
pub mod todo;

#[cfg(test)]
pub mod test_util;
