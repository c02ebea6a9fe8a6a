use pulldown_cmark::{html, Event, Options, Parser, TagEnd};

const WORDS_PER_MINUTE: usize = 200;
const EXCERPT_WORDS: usize = 30;

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Render a post body to HTML.
pub fn render(body: &str) -> String {
    let parser = Parser::new_ext(body, options());
    let mut out = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Visible text of the rendered body, without markup.
pub fn plain_text(body: &str) -> String {
    let mut text = String::with_capacity(body.len());
    for event in Parser::new_ext(body, options()) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak | Event::Rule => text.push(' '),
            Event::End(TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link) => {}
            Event::End(_) => text.push(' '),
            _ => {}
        }
    }
    text
}

pub fn word_count(body: &str) -> usize {
    plain_text(body).split_whitespace().count()
}

/// Minutes needed to read the body, never less than one.
pub fn reading_time(body: &str) -> usize {
    word_count(body).div_ceil(WORDS_PER_MINUTE).max(1)
}

/// First words of the body as plain text, with an ellipsis when cut.
pub fn excerpt(body: &str) -> String {
    let text = plain_text(body);
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= EXCERPT_WORDS {
        return words.join(" ");
    }
    format!("{} …", words[..EXCERPT_WORDS].join(" "))
}
