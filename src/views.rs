use ansi_to_html::Esc;

use crate::models::Paste;

/// Usage notes shown on the landing page.
const INDEX_PAGE: &str = include_str!("../assets/index.md");

const NEW_PASTE_FORM: &str = r#"<form id="new-paste">
  <input type="text" name="heading" placeholder="My Paste">
  <textarea name="data" rows="20" required></textarea>
  <button type="submit">Save</button>
  <p id="result"></p>
</form>"#;

/// Render the landing page.
pub fn index(static_base_url: &str) -> String {
    let body = format!(
        "{NEW_PASTE_FORM}\n{usage}",
        usage = markdown::to_html(INDEX_PAGE)
    );
    layout("pastebin", static_base_url, &body, true)
}

/// Render a paste. Heading and text are shown exactly as submitted.
pub fn paste(paste: &Paste, static_base_url: &str) -> String {
    let heading = Esc(&paste.heading).to_string();
    let data = Esc(&paste.data);
    let opens = match paste.open_count {
        1 => "1 time".to_owned(),
        n => format!("{n} times"),
    };

    let body = format!(
        "<h1>{heading}</h1>\n\
         <p class=\"meta\">Opened {opens}</p>\n\
         <pre class=\"paste\">{data}</pre>"
    );
    layout(&heading, static_base_url, &body, false)
}

fn layout(title: &str, static_base_url: &str, body: &str, with_script: bool) -> String {
    let script = if with_script {
        format!("\n<script src=\"{static_base_url}/app.js\"></script>")
    } else {
        String::new()
    };

    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n\
         <link rel=\"stylesheet\" href=\"{static_base_url}/style.css\">\n\
         </head>\n\
         <body>\n\
         <main>\n{body}\n</main>{script}\n\
         </body>\n\
         </html>\n"
    )
}
