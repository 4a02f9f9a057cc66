// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Translatable messages in Markdown document bodies.
//!
//! A body is split into runs of inline Markdown (text, emphasis,
//! links, inline code) and structural Markdown (headings, lists, block
//! quotes). Each inline run becomes one message, rendered back to
//! normalized Markdown.

use pulldown_cmark::{Event, Options, Parser, Tag};
use pulldown_cmark_to_cmark::{cmark_resume_with_options, Options as CmarkOptions, State};

fn new_cmark_parser(text: &str) -> Parser<'_, '_> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    Parser::new_ext(text, options)
}

/// Parse `text` into Markdown events labeled with the line where they
/// start.
///
/// Soft breaks are turned into a single space.
pub fn extract_events(text: &str) -> Vec<(usize, Event<'_>)> {
    let newlines = text
        .match_indices('\n')
        .map(|(offset, _)| offset)
        .collect::<Vec<_>>();
    new_cmark_parser(text)
        .into_offset_iter()
        .map(|(event, range)| {
            let lineno = newlines.partition_point(|&offset| offset < range.start) + 1;
            let event = match event {
                Event::SoftBreak => Event::Text(" ".into()),
                event => event,
            };
            (lineno, event)
        })
        .collect()
}

/// Check if `event` belongs to the text of a message.
fn is_inline(event: &Event) -> bool {
    match event {
        Event::Start(tag) | Event::End(tag) => matches!(
            tag,
            Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link(..) | Tag::Image(..)
        ),
        Event::Text(_)
        | Event::Code(_)
        | Event::FootnoteReference(_)
        | Event::SoftBreak
        | Event::HardBreak => true,
        _ => false,
    }
}

/// Rendering options for messages: fenced code uses three backticks,
/// emphasis `_` and strong emphasis `**`.
fn render_options() -> CmarkOptions<'static> {
    CmarkOptions {
        code_block_token_count: 3,
        list_token: '-',
        emphasis_token: '_',
        strong_token: "**",
        ..CmarkOptions::default()
    }
}

/// Render a run of events, continuing from `state`.
///
/// Returns the Markdown of the run and the renderer state after it.
/// The run is rendered as if it were not nested: indentation of
/// enclosing block quotes and list items stays out of the message.
fn render_run(
    run: &[(usize, Event)],
    state: Option<State<'static>>,
) -> (String, State<'static>) {
    let events = || run.iter().map(|(_, event)| event);

    let mut message = String::new();
    let unnested = state.as_ref().map(|state| State {
        padding: Vec::new(),
        ..state.clone()
    });
    cmark_resume_with_options(events(), &mut message, unnested, render_options())
        .expect("rendering into a String");

    // Nesting still matters for the runs that follow.
    let next_state =
        cmark_resume_with_options(events(), String::new(), state, render_options())
            .expect("rendering into a String");
    (message, next_state)
}

/// Extract the translatable messages of a Markdown `document`.
///
/// Returns each message with the line number where it starts.
///
/// # Examples
///
/// ```
/// use grow_helpers::messages::extract_messages;
///
/// assert_eq!(
///     extract_messages("# A heading\n\nSome *text*.\n"),
///     vec![(1, "A heading".into()), (3, "Some _text_.".into())],
/// );
/// ```
pub fn extract_messages(document: &str) -> Vec<(usize, String)> {
    let events = extract_events(document);
    let mut messages = Vec::new();
    let mut state = None;
    let mut rest = &events[..];
    while let Some((lineno, first)) = rest.first() {
        let inline = is_inline(first);
        let len = rest
            .iter()
            .position(|(_, event)| is_inline(event) != inline)
            .unwrap_or(rest.len());
        let (group, tail) = rest.split_at(len);
        let (text, next_state) = render_run(group, state);
        if inline {
            messages.push((*lineno, text));
        }
        state = Some(next_state);
        rest = tail;
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[track_caller]
    fn assert_extract_messages(document: &str, expected: Vec<(usize, &str)>) {
        assert_eq!(
            extract_messages(document)
                .iter()
                .map(|(lineno, msg)| (*lineno, &msg[..]))
                .collect::<Vec<_>>(),
            expected,
        )
    }

    #[test]
    fn extract_messages_empty() {
        assert_extract_messages("", vec![]);
    }

    #[test]
    fn extract_messages_paragraphs() {
        assert_extract_messages(
            "This is\n\
             the first\n\
             paragraph.\n\
             \n\
             Second paragraph.",
            vec![(1, "This is the first paragraph."), (5, "Second paragraph.")],
        );
    }

    #[test]
    fn extract_messages_styled_text() {
        assert_extract_messages(
            "**This** __~~message~~__ _has_ `code` *style*\n",
            vec![(1, "**This** **~~message~~** _has_ `code` _style_")],
        );
    }

    #[test]
    fn extract_messages_links() {
        assert_extract_messages(
            "See [this page](https://example.com) for more info.",
            vec![(1, "See [this page](https://example.com) for more info.")],
        );
    }

    #[test]
    fn extract_messages_headings_and_lists() {
        assert_extract_messages(
            "Some text\n\
             # Headline News\n\
             \n\
             * A\n\
             * List\n\
             \n\
             ## Subheading\n",
            vec![
                (1, "Some text"),
                (2, "Headline News"),
                (4, "A"),
                (5, "List"),
                (7, "Subheading"),
            ],
        );
    }

    #[test]
    fn extract_messages_block_quote() {
        assert_extract_messages(
            "Before the quote:\n\
             \n\
             > First quoted paragraph.\n\
             >\n\
             > Second quoted paragraph.\n\
             \n\
             After the quote.\n",
            vec![
                (1, "Before the quote:"),
                (3, "First quoted paragraph."),
                (5, "Second quoted paragraph."),
                (7, "After the quote."),
            ],
        );
    }

    #[test]
    fn extract_messages_quoted_code_block() {
        // The quote markers of the code lines are not part of the message.
        assert_extract_messages(
            "Install it with:\n\
             \n\
             > ```sh\n\
             > grow install\n\
             >\n\
             >   --verbose\n\
             > ```\n\
             >\n\
             > Then build.\n",
            vec![
                (1, "Install it with:"),
                (4, "grow install\n\n  --verbose\n"),
                (9, "Then build."),
            ],
        );
    }

    #[test]
    fn extract_messages_code_block() {
        assert_extract_messages(
            "Preamble\n```rust\nfn hello() {\n  some_code()\n\n  todo!()\n}\n```\nPostamble",
            vec![
                (1, "Preamble"),
                (3, "fn hello() {\n  some_code()\n\n  todo!()\n}\n"),
                (9, "Postamble"),
            ],
        );
    }
}
