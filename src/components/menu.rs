use yew::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuItem {
    pub label: AttrValue,
    pub href: AttrValue,
}

#[derive(Properties, PartialEq)]
pub struct MenuProps {
    pub items: Vec<MenuItem>,
    /// Open state on small screens, exposed as `aria-expanded`.
    #[prop_or_default]
    pub expanded: bool,
    #[prop_or_default]
    pub id: Option<AttrValue>,
    #[prop_or_default]
    pub children: Children,
}

/// Site navigation: a list of links followed by any children.
#[function_component(Menu)]
pub fn menu(props: &MenuProps) -> Html {
    html! {
        <nav
            class="ygc-menu"
            role="navigation"
            id={props.id.clone()}
            aria-expanded={if props.expanded { "true" } else { "false" }}
        >
            <ul class="ygc-menu-list">
                { for props.items.iter().enumerate().map(|(i, item)| html! {
                    <li class="ygc-menu-item" key={i}>
                        <a class="ygc-menu-link" href={item.href.clone()}>{ &item.label }</a>
                    </li>
                }) }
            </ul>
            { for props.children.iter() }
        </nav>
    }
}
