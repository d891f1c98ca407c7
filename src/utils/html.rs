use ammonia;

/// Sanitizes question stems and option markup before they enter the bank.
///
/// Stems may carry inline HTML or math markup authored by admins; ammonia's
/// whitelist keeps the harmless formatting tags and drops anything executable
/// (<script>, event handlers, iframes). Plain-text math such as `x^2 + 1` or
/// `\frac{a}{b}` passes through untouched.
pub fn clean_markup(input: &str) -> String {
    ammonia::clean(input)
}
