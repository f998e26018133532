//! HTML pages.
//!
//! Templates are compiled into the binary and rendered with minijinja. The
//! `.html` names turn on HTML auto-escaping for every value.

use formchat_application::FormView;
use formchat_core::error::{FormChatError, Result};
use formchat_core::form::FormCatalog;
use minijinja::{Environment, context};
use serde::Serialize;

const LAYOUT: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{% block title %}FormChat{% endblock %}</title>
<style>
body { font-family: system-ui, sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; color: #222; }
table { border-collapse: collapse; width: 100%; margin-bottom: 1.5rem; }
td, th { border-bottom: 1px solid #ddd; padding: 0.4rem; text-align: left; }
.transcript { border: 1px solid #ccc; border-radius: 6px; padding: 0.8rem; min-height: 8rem; margin-bottom: 0.8rem; }
.user { color: #05509b; white-space: pre-wrap; }
.assistant { color: #333; white-space: pre-wrap; }
.error { color: #b00020; }
.next a { margin-right: 1rem; }
</style>
</head>
<body>
{% block body %}{% endblock %}
</body>
</html>
"#;

const HOME: &str = r#"{% extends "layout.html" %}
{% block body %}
<h1>Forms</h1>
{% for form in forms %}
<section>
<h2>{{ form.title }}</h2>
{% if form.description %}<p>{{ form.description }}</p>{% endif %}
<p><a href="/forms/{{ form.name }}">{{ form.button_text }}</a></p>
<a href="/forms/{{ form.name }}"><img src="/forms/{{ form.name }}/qr" class="qr-code" alt="QR code for {{ form.title }}" width="150" height="150"></a>
</section>
{% else %}
<p>No forms are configured.</p>
{% endfor %}
{% endblock %}
"#;

const FORM: &str = r#"{% extends "layout.html" %}
{% block title %}{{ form.title }}{% endblock %}
{% block body %}
<p><a href="/">All forms</a></p>
<h1>{{ form.title }}</h1>
{% if form.description %}<p>{{ form.description }}</p>{% endif %}
{% if form.context_form and form.prefill %}<p>Using your saved {{ form.context_form }} details.</p>{% endif %}
<table>
<thead><tr><th>Field</th><th>Value</th></tr></thead>
<tbody>
{% for field in form.fields %}
<tr><td>{{ field.label }}</td><td id="field-{{ field.name }}">{{ form.prefill[field.name] or "" }}</td></tr>
{% endfor %}
</tbody>
</table>
<div class="transcript" id="transcript">
{% for entry in form.transcript %}
<p class="{{ entry.role }}">{{ entry.text }}</p>
{% endfor %}
</div>
<form id="chat" data-chat-url="{{ chat_url|safe }}">
<input id="message" name="message" autocomplete="off" size="60" autofocus>
<button type="submit">Send</button>
</form>
<p class="next" id="next"></p>
<script>
const chat = document.getElementById('chat');
const input = document.getElementById('message');
const transcript = document.getElementById('transcript');
const next = document.getElementById('next');

function append(role, text) {
  const p = document.createElement('p');
  p.className = role;
  p.textContent = text;
  transcript.appendChild(p);
}

chat.addEventListener('submit', async (event) => {
  event.preventDefault();
  const message = input.value.trim();
  if (!message) return;
  input.value = '';
  append('user', message);
  const res = await fetch(chat.dataset.chatUrl, {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify({ message: message })
  });
  const body = await res.json();
  if (!res.ok) {
    append('error', body.message);
    return;
  }
  for (const text of body.messages) append('assistant', text);
  for (const [name, value] of Object.entries(body.field_updates)) {
    const cell = document.getElementById('field-' + name);
    if (cell) cell.textContent = value;
  }
  if (body.saved) append('assistant', 'Saved.');
  next.replaceChildren();
  for (const form of body.next_forms) {
    const a = document.createElement('a');
    a.href = form.url;
    a.textContent = 'Continue with ' + form.title;
    next.appendChild(a);
  }
});
</script>
{% endblock %}
"#;

#[derive(Serialize)]
struct FormLink<'a> {
    name: &'a str,
    title: &'a str,
    description: &'a str,
    button_text: &'a str,
}

/// Compiled page templates.
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in [("layout.html", LAYOUT), ("home.html", HOME), ("form.html", FORM)] {
            env.add_template(name, source)
                .map_err(|e| FormChatError::internal(format!("template {}: {}", name, e)))?;
        }
        Ok(Self { env })
    }

    pub fn home(&self, catalog: &FormCatalog) -> Result<String> {
        let forms: Vec<FormLink<'_>> = catalog
            .forms()
            .iter()
            .map(|form| FormLink {
                name: form.name(),
                title: form.title(),
                description: form.description(),
                button_text: form.button_text(),
            })
            .collect();
        self.render("home.html", context! { forms => forms })
    }

    /// Renders a form page. `key` is the `?key=` value the page was opened
    /// with and is carried over to chat requests.
    pub fn form(&self, view: &FormView, key: Option<&str>) -> Result<String> {
        // Built from url-encoded parts only, so it is rendered unescaped.
        let mut chat_url = format!("/forms/{}/chat", urlencoding::encode(&view.name));
        if let Some(key) = key.filter(|k| !k.is_empty()) {
            chat_url.push_str("?key=");
            chat_url.push_str(&urlencoding::encode(key));
        }
        self.render("form.html", context! { form => view, chat_url => chat_url })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(|e| FormChatError::internal(format!("failed to render {}: {}", name, e)))
    }
}
