/// The argument tokens a command has yet to consume, kept in reverse so the
/// next token is a cheap `pop`.
pub(crate) struct Args {
    rargs: Vec<String>,
}

impl Args {
    pub(crate) fn new(mut args: Vec<String>) -> Self {
        args.reverse();
        Self { rargs: args }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rargs.is_empty()
    }

    pub(crate) fn peek(&self) -> Option<&str> {
        self.rargs.last().map(String::as_str)
    }

    pub(crate) fn peek_flag(&self) -> Option<&str> {
        self.peek().filter(|it| it.starts_with('-'))
    }

    pub(crate) fn next(&mut self) -> Option<String> {
        self.rargs.pop()
    }
}
