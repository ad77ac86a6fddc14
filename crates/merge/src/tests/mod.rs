mod helpers;
mod tuple_tests;
