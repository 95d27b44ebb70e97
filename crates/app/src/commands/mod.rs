pub mod list;
pub mod settings;
pub mod take;

use anyhow::{Result, anyhow};
use quiz_core::model::{ListItem, QuizId, SectionType, TopicId, TopicStructure};
use services::AppServices;
use storage::ContentRepository;

async fn load_topic(services: &AppServices, topic: &str) -> Result<TopicStructure> {
    services
        .catalog()
        .topic_structure(&TopicId::new(topic))
        .await
        .map_err(|err| anyhow!("topic {topic}: {err}"))
}

/// Finds an item by id in either list of the topic.
fn find_item<'a>(topic: &'a TopicStructure, id: &str) -> Option<&'a ListItem> {
    let id = QuizId::new(id);
    topic
        .find_item(&id, SectionType::Practice)
        .or_else(|| topic.find_item(&id, SectionType::Qbank))
}
