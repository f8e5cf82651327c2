//! HTML comparison grid.
//!
//! The grid is a stack of `div` rows: one header row carrying each record's
//! image, name and maker, then one row per comparison attribute. Blank
//! cells show `-`. Styling is left to the hosting page; the container sets
//! `--lens-count` so a stylesheet can size its columns.

use std::{borrow::Cow, cell::RefCell, collections::BTreeMap, fmt::Write as _, rc::Rc};

use crate::{
    config::Config,
    filter::FilterCriteria,
    options::derive_filter_options,
    parser::Record,
    state::{StateObserver, ViewState},
};

pub const LOAD_FAILED_MESSAGE: &str =
    "レンズデータの取得に失敗しました。しばらくしてから再度お試しください。";
pub const NO_DATA_MESSAGE: &str = "表示するレンズデータがありません。";
pub const LOADING_MESSAGE: &str = "読み込み中...";
const ATTRIBUTE_HEADER: &str = "項目";
const PLACEHOLDER_IMAGE: &str = "placeholder.png";
const BLANK_CELL: &str = "-";
const ANY_OPTION: &str = "すべて";

/// Which columns feed the header cells and which rows to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    pub key_field: String,
    pub maker_field: String,
    pub image_field: String,
    pub rows: Vec<String>,
}

impl GridLayout {
    pub fn from_config(config: &Config) -> Self {
        Self {
            key_field: config.fields.key.clone(),
            maker_field: config.fields.maker.clone(),
            image_field: config.fields.image.clone(),
            rows: config.compare_rows.clone(),
        }
    }
}

pub fn escape_html(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() { placeholder } else { value }
}

pub fn render_message(message: &str) -> String {
    format!("<p>{}</p>\n", escape_html(message))
}

/// Grid for `records`, or the no-data message when there are none.
pub fn render_grid(records: &[Record], layout: &GridLayout) -> String {
    if records.is_empty() {
        return render_message(NO_DATA_MESSAGE);
    }

    let mut html = String::new();
    let _ = writeln!(
        html,
        "<div id=\"lens-comparison-container\" style=\"--lens-count: {}\">",
        records.len()
    );

    html.push_str("<div class=\"header-row\">");
    let _ = write!(html, "<div class=\"header-cell\">{ATTRIBUTE_HEADER}</div>");
    for record in records {
        let name = escape_html(record.value(&layout.key_field));
        let _ = write!(
            html,
            "<div class=\"header-cell\"><img src=\"{src}\" alt=\"{name}\" class=\"lens-image\">\
             <div class=\"lens-name\">{name}</div><div>{maker}</div></div>",
            src = escape_html(or_placeholder(
                record.value(&layout.image_field),
                PLACEHOLDER_IMAGE
            )),
            maker = escape_html(record.value(&layout.maker_field)),
        );
    }
    html.push_str("</div>\n");

    for row in &layout.rows {
        html.push_str("<div class=\"data-row\">");
        let _ = write!(html, "<div class=\"data-cell\">{}</div>", escape_html(row));
        for record in records {
            let _ = write!(
                html,
                "<div class=\"data-cell\">{}</div>",
                escape_html(or_placeholder(record.value(row), BLANK_CELL))
            );
        }
        html.push_str("</div>\n");
    }

    html.push_str("</div>\n");
    html
}

/// Static `<select>` controls listing each filter field's options, with the
/// active constraint pre-selected.
pub fn render_filter_form(
    options: &BTreeMap<String, Vec<String>>,
    order: &[String],
    criteria: Option<&FilterCriteria>,
) -> String {
    let mut html = String::from("<form class=\"lens-filters\" method=\"get\">\n");
    for field in order {
        let Some(values) = options.get(field) else {
            continue;
        };
        let current = criteria
            .and_then(|c| c.active().find(|crit| &crit.field == field))
            .map(|crit| crit.value.as_str())
            .unwrap_or("");
        let name = escape_html(field);
        let _ = write!(
            html,
            "<label>{name} <select name=\"{name}\"><option value=\"\">{ANY_OPTION}</option>"
        );
        for value in values {
            let selected = if value == current { " selected" } else { "" };
            let value = escape_html(value);
            let _ = write!(html, "<option value=\"{value}\"{selected}>{value}</option>");
        }
        html.push_str("</select></label>\n");
    }
    html.push_str("</form>\n");
    html
}

/// Body fragment for any state of the cycle.
pub fn render_state(state: &ViewState, config: &Config) -> String {
    let layout = GridLayout::from_config(config);
    match state {
        ViewState::Loading => render_message(LOADING_MESSAGE),
        ViewState::Error { .. } => render_message(LOAD_FAILED_MESSAGE),
        ViewState::Loaded { full } => {
            let fields = config.filter_fields();
            let options =
                derive_filter_options(&full.records, &fields, Some(config.fields.size.as_str()));
            render_filter_form(&options, &fields, None) + &render_grid(&full.records, &layout)
        }
        ViewState::Filtered {
            full,
            criteria,
            subset,
        } => {
            let fields = config.filter_fields();
            let options =
                derive_filter_options(&full.records, &fields, Some(config.fields.size.as_str()));
            render_filter_form(&options, &fields, Some(criteria)) + &render_grid(subset, &layout)
        }
        ViewState::Comparing { subset, .. } => render_grid(subset, &layout),
    }
}

pub fn render_page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"ja\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        body
    )
}

/// Re-renders the page body on every state change; [`HtmlView::handle`]
/// exposes the latest one.
#[derive(Debug, Clone)]
pub struct HtmlView {
    config: Config,
    latest: Rc<RefCell<String>>,
}

impl HtmlView {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            latest: Default::default(),
        }
    }

    /// Shared handle to the rendered body, readable after the view has been
    /// moved into a session.
    pub fn handle(&self) -> Rc<RefCell<String>> {
        Rc::clone(&self.latest)
    }
}

impl StateObserver for HtmlView {
    fn state_changed(&mut self, state: &ViewState) {
        *self.latest.borrow_mut() = render_state(state, &self.config);
    }
}
