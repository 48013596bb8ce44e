//! Conversation state for the interactive loop.

use crate::{Error, Result};

/// Speaker of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The visitor asking questions.
    User,
    /// The résumé assistant.
    Assistant,
}

/// One message in the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// Who said it.
    pub role: Role,
    /// What was said.
    pub content: String,
}

/// Where the session is in its question/answer cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the visitor to type and submit.
    Idle,
    /// A question was submitted and the answer is pending.
    AwaitingAnswer {
        /// The submitted question.
        question: String,
    },
    /// The latest answer is on screen.
    Displaying,
}

/// History plus the input box, driven through explicit transitions.
#[derive(Debug, Clone)]
pub struct ChatSession {
    state: SessionState,
    input: String,
    history: Vec<Turn>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// Fresh session with empty history.
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            input: String::new(),
            history: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current contents of the input box.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Every turn so far, oldest first.
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Replaces the input box contents. Typing dismisses a displayed answer.
    pub fn set_input(&mut self, text: impl Into<String>) -> Result<()> {
        match self.state {
            SessionState::Idle | SessionState::Displaying => {
                self.state = SessionState::Idle;
                self.input = text.into();
                Ok(())
            }
            SessionState::AwaitingAnswer { .. } => Err(Error::Session(
                "cannot edit the input while an answer is pending".to_string(),
            )),
        }
    }

    /// Empties the input box.
    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    /// Submits the input box. Blank input is ignored and yields `None`.
    pub fn submit(&mut self) -> Result<Option<String>> {
        if self.state != SessionState::Idle {
            return Err(Error::Session(format!(
                "cannot submit while {:?}",
                self.state
            )));
        }
        let question = self.input.trim().to_string();
        if question.is_empty() {
            return Ok(None);
        }
        self.clear_input();
        self.state = SessionState::AwaitingAnswer {
            question: question.clone(),
        };
        Ok(Some(question))
    }

    /// Stores the answer for the pending question.
    pub fn record_answer(&mut self, answer: impl Into<String>) -> Result<()> {
        let SessionState::AwaitingAnswer { question } = &self.state else {
            return Err(Error::Session("no question is awaiting an answer".to_string()));
        };
        self.history.push(Turn {
            role: Role::User,
            content: question.clone(),
        });
        self.history.push(Turn {
            role: Role::Assistant,
            content: answer.into(),
        });
        self.state = SessionState::Displaying;
        Ok(())
    }

    /// Returns to `Idle` after the answer was shown.
    pub fn acknowledge(&mut self) -> Result<()> {
        if self.state != SessionState::Displaying {
            return Err(Error::Session(format!(
                "nothing to acknowledge while {:?}",
                self.state
            )));
        }
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Latest assistant reply, if any.
    pub fn last_answer(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|turn| turn.role == Role::Assistant)
            .map(|turn| turn.content.as_str())
    }
}
