// Declare the testing submodule
pub mod testing;
