//! Obfuscated name detection.

/// Short names that are meaningful despite their length.
const SHORT_NAMES: [&str; 2] = ["run", "add"];

/// Prefixes renamers use for generated names.
const GENERATED_PREFIXES: [&str; 4] = ["class", "method", "field", "var"];

/// Returns `true` if `name` carries no information about the entity.
///
/// A name is judged obfuscated when it is at most 3 characters long (except a few known short
/// names) or starts with a generated prefix such as `method` or `field`.
///
/// # Examples
///
/// ```rust
/// use remapper::similarity::is_obfuscated_name;
///
/// assert!(is_obfuscated_name("ab"));
/// assert!(is_obfuscated_name("method123"));
/// assert!(!is_obfuscated_name("run"));
/// assert!(!is_obfuscated_name("toString"));
/// ```
#[must_use]
pub fn is_obfuscated_name(name: &str) -> bool {
    (name.chars().count() <= 3 && !SHORT_NAMES.contains(&name))
        || GENERATED_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Whether two names allow the entities to be the same.
///
/// Two meaningful names must be equal; an obfuscated name on either side matches anything.
/// Initializer names (`<init>`, `<clinit>`) are never renamed and only match themselves.
#[must_use]
pub fn names_compatible(a: &str, b: &str) -> bool {
    if a.starts_with('<') || b.starts_with('<') {
        a == b
    } else if !is_obfuscated_name(a) && !is_obfuscated_name(b) {
        a == b
    } else {
        true
    }
}

/// The part of an internal class name after the package.
pub(crate) fn simple_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obfuscated() {
        assert!(is_obfuscated_name(""));
        assert!(is_obfuscated_name("a"));
        assert!(is_obfuscated_name("aB1"));
        assert!(is_obfuscated_name("class42"));
        assert!(is_obfuscated_name("var7"));
        assert!(is_obfuscated_name("fieldNames"));
        assert!(!is_obfuscated_name("add"));
        assert!(!is_obfuscated_name("main"));
        assert!(!is_obfuscated_name("<init>"));
    }

    #[test]
    fn compatibility() {
        assert!(names_compatible("main", "main"));
        assert!(!names_compatible("main", "exit"));
        assert!(names_compatible("main", "ab"));
        assert!(names_compatible("method1", "method9"));
        assert!(!names_compatible("<init>", "<clinit>"));
        assert!(!names_compatible("<init>", "a"));
    }

    #[test]
    fn simple_names() {
        assert_eq!(simple_name("com/example/Foo"), "Foo");
        assert_eq!(simple_name("Foo"), "Foo");
    }
}
