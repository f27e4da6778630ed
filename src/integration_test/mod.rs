#![cfg(test)]

mod test_utils;
