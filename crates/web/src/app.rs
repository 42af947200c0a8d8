use leptos::*;
use leptos_meta::*;

use crate::components::TaskManager;

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Title text="Taskboard"/>
        <main>
            <TaskManager/>
        </main>
    }
}
