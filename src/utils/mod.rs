pub mod compilation;
pub mod test_utils;
