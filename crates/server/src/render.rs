use handlebars::{Handlebars, RenderError, TemplateError};
use log::debug;
use serde::Serialize;

const LAYOUT: &str = include_str!("../templates/layout.hbs");
const HOME: &str = include_str!("../templates/home.hbs");
const COIN: &str = include_str!("../templates/coin.hbs");
const ERROR: &str = include_str!("../templates/error.hbs");

/// Page templates compiled into the binary. `layout` is used as a partial
/// by every page.
pub struct Templates {
    handlebars: Handlebars<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, TemplateError> {
        let mut handlebars = Handlebars::new();

        for (name, source) in [("layout", LAYOUT), ("home", HOME), ("coin", COIN), ("error", ERROR)] {
            handlebars.register_template_string(name, source)?;
        }
        debug!("Registered {} page templates", handlebars.get_templates().len());

        Ok(Templates { handlebars })
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, RenderError> {
        self.handlebars.render(name, data)
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorView {
    pub title: String,
    pub status: u16,
    pub message: String,
}
