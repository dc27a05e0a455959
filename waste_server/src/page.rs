//! HTML of the single-page front end.
//!
use common::protocol::UPLOAD_FIELD;

use crate::error::ModelError;

pub const TITLE: &str = "Waste Segregation Model ♻️";

/// Shown instead of the upload control when no model is available.
pub const MODEL_UNAVAILABLE_WARNING: &str =
    "Model could not be loaded. Please check the URL and your file.";

const PAGE_TITLE: &str = "Waste Segregation App";

const DESCRIPTION: &str = "This application uses a trained <strong>MobileNetV2</strong> model to \
    classify images as either <strong>Biodegradable</strong> or \
    <strong>Non-Biodegradable</strong>.";

const FAVICON: &str = "data:image/svg+xml,<svg xmlns='http://www.w3.org/2000/svg' \
    viewBox='0 0 100 100'><text y='.9em' font-size='90'>♻️</text></svg>";

const STYLE: &str = r#"
    body { font-family: sans-serif; max-width: 46rem; margin: 2rem auto; padding: 0 1rem; }
    .error { background: #fde8e8; color: #8a1c1c; padding: .75rem 1rem; border-radius: .4rem; }
    .success { background: #e6f6ea; color: #1c6b32; padding: .75rem 1rem; border-radius: .4rem; }
    .info { background: #e8f1fd; color: #1c4a8a; padding: .75rem 1rem; border-radius: .4rem; }
    .warning { background: #fdf6e3; color: #7a5b00; padding: .75rem 1rem; border-radius: .4rem; }
    #busy { display: none; }
    figure { margin: 1rem 0; }
    figure img { width: 100%; }
    figcaption { color: #666; text-align: center; }
"#;

/// Uploads the chosen file and renders the answer below the control.
const SCRIPT: &str = r#"
    const input = document.getElementById('upload');
    const busy = document.getElementById('busy');
    const result = document.getElementById('result');

    input.addEventListener('change', async () => {
        const file = input.files[0];
        if (!file) {
            return;
        }
        const form = new FormData();
        form.append(input.name, file);

        result.replaceChildren();
        busy.style.display = 'block';
        try {
            const resp = await fetch('/api/predict', { method: 'POST', body: form });
            const body = await resp.json();
            if (!resp.ok) {
                result.innerHTML = '<p class="error"></p>';
                result.firstChild.textContent = body.error;
                return;
            }
            const figure = document.createElement('figure');
            const img = document.createElement('img');
            img.src = URL.createObjectURL(file);
            const caption = document.createElement('figcaption');
            caption.textContent = 'Successfully Uploaded Image';
            figure.append(img, caption);

            const prediction = document.createElement('p');
            prediction.innerHTML = '<strong>Prediction:</strong> This is <strong></strong> waste.';
            prediction.children[1].textContent = body.label;

            const confidence = document.createElement('p');
            confidence.innerHTML = '<strong>Confidence:</strong> The model is <strong></strong> confident in this prediction.';
            confidence.children[1].textContent = body.confidence_text;

            result.append(figure, prediction, confidence);
        } catch (err) {
            result.innerHTML = '<p class="error"></p>';
            result.firstChild.textContent = 'Prediction failed: ' + err;
        } finally {
            busy.style.display = 'none';
        }
    });
"#;

/// Page with the upload control, rendered once the model is ready.
///
/// `notices` report the provisioning steps that ran while serving this page.
pub fn render_ready(notices: &[&str]) -> String {
    let mut body: String = notices
        .iter()
        .map(|notice| format!(r#"<p class="success">{}</p>"#, escape_html(notice)))
        .collect();
    body.push_str(&format!(
        r#"<label for="upload">Choose an image...</label>
    <input type="file" id="upload" name="{UPLOAD_FIELD}" accept=".jpg,.jpeg,.png,image/jpeg,image/png">
    <p id="busy" class="info">Classifying image...</p>
    <div id="result"></div>
    <script>{SCRIPT}</script>"#
    ));

    layout(&body)
}

/// Page explaining why no prediction can be made.
pub fn render_failed(error: &ModelError) -> String {
    let mut body = format!(r#"<p class="error">{}</p>"#, escape_html(&error.to_string()));
    if let Some(hint) = error.hint() {
        body.push_str(&format!(r#"<p class="info">{}</p>"#, escape_html(hint)));
    }
    body.push_str(&format!(
        r#"<p class="warning">{MODEL_UNAVAILABLE_WARNING}</p>"#
    ));

    layout(&body)
}

fn layout(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{PAGE_TITLE}</title>
    <link rel="icon" href="{FAVICON}">
    <style>{STYLE}</style>
</head>
<body>
    <h1>{TITLE}</h1>
    <p>{DESCRIPTION}</p>
    {body}
</body>
</html>
"#
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
