use dioxus::prelude::*;
use dioxus_router::{Outlet, Routable};

use crate::context::AppContext;
use crate::views::TopicView;

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", TopicView)] Topic {},
}

#[component]
fn Layout() -> Element {
    let ctx = use_context::<AppContext>();
    let theme = ctx.theme().as_str();
    let sidebar = if ctx.sidebar_collapsed() {
        "sidebar sidebar--collapsed"
    } else {
        "sidebar"
    };
    rsx! {
        div { class: "app theme-{theme}",
            nav { class: "{sidebar}",
                h1 { "Practice Exams" }
            }
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}
