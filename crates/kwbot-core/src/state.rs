//! Process-memory state for the currently open survey and the last posted
//! result. Nothing here survives a restart.

use crate::domain::MessageId;

/// Identity of the currently open survey message and its target week.
///
/// Both fields are set together by `save`; there is no partial state.
#[derive(Clone, Copy, Debug, Default)]
pub struct SurveyState {
    message_id: Option<MessageId>,
    week: Option<u32>,
}

impl SurveyState {
    pub fn save(&mut self, id: MessageId, week: u32) {
        self.message_id = Some(id);
        self.week = Some(week);
    }

    pub fn is_available(&self) -> bool {
        self.message_id.is_some() && self.week.is_some()
    }

    pub fn id(&self) -> Option<MessageId> {
        self.message_id
    }

    pub fn week(&self) -> Option<u32> {
        self.week
    }
}

/// Identity of the last posted result message. Cleared every time a new
/// survey is posted so the first check of a cycle has nothing to replace.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResultState {
    message_id: Option<MessageId>,
}

impl ResultState {
    pub fn save(&mut self, id: MessageId) {
        self.message_id = Some(id);
    }

    pub fn clear(&mut self) {
        self.message_id = None;
    }

    pub fn is_available(&self) -> bool {
        self.message_id.is_some()
    }

    pub fn id(&self) -> Option<MessageId> {
        self.message_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survey_state_available_only_after_save() {
        let mut st = SurveyState::default();
        assert!(!st.is_available());
        assert_eq!(st.id(), None);
        assert_eq!(st.week(), None);

        st.save(MessageId(10), 14);
        assert!(st.is_available());
        assert_eq!(st.id(), Some(MessageId(10)));
        assert_eq!(st.week(), Some(14));
    }

    #[test]
    fn survey_state_save_overwrites() {
        let mut st = SurveyState::default();
        st.save(MessageId(1), 14);
        st.save(MessageId(2), 15);
        assert_eq!(st.id(), Some(MessageId(2)));
        assert_eq!(st.week(), Some(15));
    }

    #[test]
    fn result_state_save_and_clear() {
        let mut st = ResultState::default();
        assert!(!st.is_available());

        st.save(MessageId(3));
        assert!(st.is_available());
        assert_eq!(st.id(), Some(MessageId(3)));

        st.clear();
        assert!(!st.is_available());
        assert_eq!(st.id(), None);
    }
}
