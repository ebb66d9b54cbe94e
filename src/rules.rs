//! Detection rules and the default seed vocabulary.

pub(crate) mod detection;
pub mod keywords;

#[cfg(test)]
mod tests;
