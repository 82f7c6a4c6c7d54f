/// Ternary expression.  Rust's `if` is already an expression, but
/// `cargo fmt` breaks it across five lines, and the border rules of
/// the kernels and the seam search read far better as a table of
/// one-liners.
#[macro_export]
macro_rules! cq {
    ($condition: expr, $_true: expr, $_false: expr) => {
        if $condition {
            $_true
        } else {
            $_false
        }
    };
}
