use crate::domain::MessageId;

/// Outgoing rich message, kept platform-neutral. The adapter turns this
/// into the platform's native embed type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingEmbed {
    pub title: String,
    pub description: String,
    pub colour: u32,
    pub fields: Vec<EmbedField>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// What the core needs to know about a fetched channel message: enough to
/// decide whether cleanup may delete it.
#[derive(Clone, Debug)]
pub struct MessageSummary {
    pub id: MessageId,
    pub embed_titles: Vec<String>,
}
