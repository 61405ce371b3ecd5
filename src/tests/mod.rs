pub mod test_discretizer;
