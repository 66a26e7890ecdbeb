//! # Utility Functions Module
//!
//! Helpers for building the argument lists of external commands.

/// Converts any iterable of string-like items to `Vec<String>`.
///
/// # Example
/// ```rust
/// use image_reducer::utils::to_string_vec;
///
/// let depth = 8;
/// let args = to_string_vec(["-depth", &depth.to_string(), "+dither"]);
/// assert_eq!(args, vec!["-depth", "8", "+dither"]);
/// ```
pub fn to_string_vec<T, I>(items: I) -> Vec<String>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}

/// Build an argument vector from heterogeneous items.
///
/// # Example
/// ```rust
/// use image_reducer::args;
///
/// let colors = 32;
/// let args = args!["-colors", colors, "-strip"];
/// assert_eq!(args, vec!["-colors", "32", "-strip"]);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        vec![$($item.to_string()),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_string_vec_mixed_types() {
        let width = 420;
        let result = to_string_vec(["-resize", &format!("{}x600", width)]);
        assert_eq!(result, vec!["-resize".to_string(), "420x600".to_string()]);
    }

    #[test]
    fn test_to_string_vec_empty() {
        let result: Vec<String> = to_string_vec(Vec::<&str>::new());
        assert!(result.is_empty());
    }

    #[test]
    fn test_args_macro_mixes_numbers_and_strings() {
        let quality = 20u8;
        let blur = 2.5f64;
        let result = args!["-quality", quality, "-blur", format!("{}x1", blur)];
        assert_eq!(result, vec!["-quality", "20", "-blur", "2.5x1"]);
    }
}
