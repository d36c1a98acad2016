/// What the parser does with `#...` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectivePolicy {
    /// `#include` becomes an `Include` node, every other directive is ignored.
    #[default]
    Skip,
    /// Every directive is reported as an unexpected token.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub directives: DirectivePolicy,
    /// Pre-declare the functions of known standard headers when they are
    /// included.
    pub builtins: bool,
    /// Let a call resolve against a function declared later in the file.
    pub forward_calls: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directives: DirectivePolicy::Skip,
            builtins: true,
            forward_calls: false,
        }
    }
}
