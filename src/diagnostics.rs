use crate::parser::ParserError;

/// Where parse failures are reported. The parser reports each failed public
/// call exactly once.
pub trait DiagnosticSink {
    fn report(&mut self, error: &ParserError);
}

/// Reports through the `log` facade at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, error: &ParserError) {
        log::error!("{}", error);
    }
}

/// Collects every reported error.
impl DiagnosticSink for Vec<ParserError> {
    fn report(&mut self, error: &ParserError) {
        self.push(error.clone());
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, error: &ParserError) {
        (**self).report(error);
    }
}
