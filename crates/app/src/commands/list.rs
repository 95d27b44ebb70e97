//! The `quiz list` command.

use anyhow::Result;
use quiz_core::model::{ListItem, UserProfile};
use services::AppServices;
use ui::vm::{ContentListController, ContentListVm, IndicatorKind};

fn print_list(title: &str, items: &[ListItem], profile: Option<&UserProfile>) {
    println!("{title}");
    match ContentListController::new(items, profile).project(None) {
        ContentListVm::Empty { message } => println!("  {message}"),
        ContentListVm::Rows(rows) => {
            for row in rows {
                let marker = match row.indicator {
                    IndicatorKind::Lock => "[locked]",
                    IndicatorKind::Start => ">",
                };
                println!("  {:<32} {:<24} {marker}", row.name, row.id.as_str());
            }
        }
    }
}

pub async fn execute(services: &AppServices, topic: &str, profile: Option<&UserProfile>) -> Result<()> {
    let structure = super::load_topic(services, topic).await?;
    println!("{}\n", structure.name);
    print_list("Practice Tests", &structure.practice_tests, profile);
    for group in &structure.question_banks {
        println!();
        print_list(&format!("Question Banks: {}", group.category), &group.banks, profile);
    }
    if profile.is_none() {
        println!("\nPass --tier to unlock content for your plan.");
    }
    Ok(())
}
