use crate::fragment::Fragment;

/// What a solved query hands back to the front end.
///
/// At most one of message/fragments is ever present, and the error flag is
/// only set when neither is.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// A plain-text reply (conversion queries).
    Message(String),
    /// Assembled attachments (computation queries).
    Fragments(Vec<Fragment>),
    /// The service errored or had nothing to say. No detail is carried.
    NoAnswer,
}

impl Answer {
    pub fn message(&self) -> Option<&str> {
        match self {
            Answer::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn fragments(&self) -> Option<&[Fragment]> {
        match self {
            Answer::Fragments(fragments) => Some(fragments),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Answer::NoAnswer)
    }

    /// Split into the `(message, fragments, error)` triple chat front ends
    /// expect.
    pub fn into_parts(self) -> (Option<String>, Option<Vec<Fragment>>, bool) {
        match self {
            Answer::Message(message) => (Some(message), None, false),
            Answer::Fragments(fragments) => (None, Some(fragments), false),
            Answer::NoAnswer => (None, None, true),
        }
    }
}
