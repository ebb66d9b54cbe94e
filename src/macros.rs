/// Compile a regex literal once and hand out a `&'static Regex`.
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).expect("static regex literal"));
        &*RE
    }};
}

/// Build a detection [`Rule`](crate::Rule).
///
/// ```text
/// rule! {
///     name: "trailing_colon",
///     kind: RuleMask::TRAILING_COLON,
///     buckets: BucketMask::TRAILING_COLON,
///     prod: |view| { ... Vec<String> }
/// }
/// ```
macro_rules! rule {
    (
        name: $name:expr,
        kind: $kind:expr
        $(, buckets: $buckets:expr)?
        , prod: |$view:ident| $body:block
        $(,)?
    ) => {{
        $crate::Rule {
            name: $name,
            kind: $kind,
            buckets: { $crate::engine::BucketMask::empty() $(| $buckets)? },
            production: Box::new(move |$view: &$crate::BlockView<'_>| -> Vec<String> { $body }),
        }
    }};
}
