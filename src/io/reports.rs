//! Rendered output: the HTML site and the JSON run summary.
//!
//! Templates are compiled once at renderer construction and filled from
//! JSON contexts assembled out of the object model. Documentation bodies are
//! pre-rendered through the file's markup style and injected with
//! triple-stash placeholders; everything else goes through handlebars'
//! default escaping.

use std::fs;
use std::path::Path;

use chrono::Utc;
use handlebars::Handlebars;
use serde_json::{json, Value};
use tracing::info;

use crate::core::errors::{ProdocError, Result};
use crate::core::model::{FileId, Routine, SourceFile, TemplateVars};
use crate::core::session::BuildSession;
use crate::dialect::markup::{escape_html, MarkupRegistry, MarkupRenderer, VerbatimMarkup};

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{{title}}</title></head>
<body>
<h1>{{title}}</h1>
{{#if overview_html}}<div class="overview">{{{overview_html}}}</div>{{/if}}
<p>{{n_files}} files, {{n_routines}} routines, {{n_classes}} classes,
{{n_warnings}} warnings.</p>
{{#if requires}}<p>Requires version {{requires}} or later.</p>{{/if}}

{{#each directories}}
<h2>{{name}}</h2>
<ul>
{{#each files}}
<li><a href="{{local_url}}">{{basename}}</a>
({{n_routines}} routines{{#if is_batch}}, batch file{{/if}}{{#if is_main_level}}, main-level program{{/if}})</li>
{{/each}}
</ul>
{{/each}}

{{#if categories}}
<h2>Categories</h2>
<ul>
{{#each categories}}
<li>{{name}}: {{#each routines}}{{this}} {{/each}}</li>
{{/each}}
</ul>
{{/if}}

{{#if obsolete}}
<h2>Obsolete routines</h2>
<ul>{{#each obsolete}}<li>{{routine}} ({{file}})</li>{{/each}}</ul>
{{/if}}
{{#if bugs}}
<h2>Routines with known bugs</h2>
<ul>{{#each bugs}}<li>{{routine}} ({{file}})</li>{{/each}}</ul>
{{/if}}
{{#if todos}}
<h2>Routines with outstanding work</h2>
<ul>{{#each todos}}<li>{{routine}} ({{file}})</li>{{/each}}</ul>
{{/if}}

<p class="footer">generated by prodoc {{version}} on {{date}}</p>
</body>
</html>
"#;

const FILE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{{basename}}</title></head>
<body>
<h1>{{basename}}</h1>
<p class="meta">{{directory}} &middot; {{n_lines}} lines &middot;
format {{format}}/{{markup}}{{#if modification_time}} &middot; modified {{modification_time}}{{/if}}</p>
{{#if comments_html}}<div class="file-comments">{{{comments_html}}}</div>{{/if}}

{{#each routines}}
<h2 id="{{anchor}}">{{name}}</h2>
<pre class="signature">{{{signature_html}}}</pre>
{{#if is_obsolete}}<p class="flag">obsolete</p>{{/if}}
{{#if is_abstract}}<p class="flag">abstract</p>{{/if}}
{{#if comments_html}}<div class="comments">{{{comments_html}}}</div>{{/if}}
{{#if parameters}}
<h3>Parameters</h3>
<dl>
{{#each parameters}}
<dt>{{name}}{{#each attributes}} <span class="attr">{{this}}</span>{{/each}}</dt>
<dd>{{{comments_html}}}</dd>
{{/each}}
</dl>
{{/if}}
{{#if keywords}}
<h3>Keywords</h3>
<dl>
{{#each keywords}}
<dt>{{name}}{{#each attributes}} <span class="attr">{{this}}</span>{{/each}}</dt>
<dd>{{{comments_html}}}</dd>
{{/each}}
</dl>
{{/if}}
{{#if returns}}<h3>Return value</h3><p>{{returns}}</p>{{/if}}
{{#if examples}}<h3>Examples</h3><pre>{{examples}}</pre>{{/if}}
<p class="completeness">documentation: {{completeness}}</p>
{{/each}}

<p class="footer">generated by prodoc {{version}} on {{date}}</p>
</body>
</html>
"#;

/// Renders a finished session to disk.
pub struct SiteRenderer {
    handlebars: Handlebars<'static>,
    markup: MarkupRegistry,
}

impl SiteRenderer {
    /// Compile the built-in templates.
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_template_string("index", INDEX_TEMPLATE)?;
        handlebars.register_template_string("file", FILE_TEMPLATE)?;
        Ok(Self {
            handlebars,
            markup: MarkupRegistry::with_builtins(),
        })
    }

    /// Write the whole site: index page, one page per visible file, and the
    /// machine-readable run summary.
    pub fn write_site(&self, session: &BuildSession) -> Result<()> {
        let output = session.config().output.clone();
        fs::create_dir_all(&output).map_err(|e| {
            ProdocError::io(
                format!("Failed to create output directory {}", output.display()),
                e,
            )
        })?;

        write_text(&output.join("index.html"), &self.render_index(session)?)?;
        for (id, file) in session.visible_files() {
            let page = self.render_file_page(session, id, file)?;
            write_text(&output.join(file.local_url()), &page)?;
        }
        let summary = serde_json::to_string_pretty(&session.summary())?;
        write_text(&output.join("prodoc-summary.json"), &summary)?;

        info!(output = %output.display(), "site written");
        Ok(())
    }

    /// Render the site index page.
    pub fn render_index(&self, session: &BuildSession) -> Result<String> {
        let mut directories: Vec<Value> = Vec::new();
        for (_, file) in session.visible_files() {
            let directory = if file.directory.is_empty() {
                "."
            } else {
                file.directory.as_str()
            };
            let entry = json!({
                "basename": file.basename,
                "local_url": file.local_url(),
                "n_routines": session.visible_routines(file).count(),
                "is_batch": file.is_batch_file,
                "is_main_level": file.has_main_level_code,
            });
            match directories
                .iter_mut()
                .find(|d| d["name"] == json!(directory))
            {
                Some(group) => {
                    if let Some(files) = group["files"].as_array_mut() {
                        files.push(entry);
                    }
                }
                None => directories.push(json!({ "name": directory, "files": [entry] })),
            }
        }

        let categories: Vec<Value> = session
            .categories()
            .values()
            .map(|c| json!({ "name": c.name, "routines": c.routines }))
            .collect();

        let overview_html = session.overview().map(|overview| {
            self.markup_for(&session.config().markup)
                .render(&overview.comments)
        });

        let context = json!({
            "title": session.variable("title"),
            "version": crate::VERSION,
            "date": Utc::now().to_rfc2822(),
            "n_files": session.visible_files().count(),
            "n_routines": session.summary().routines,
            "n_classes": session.classes().len(),
            "n_warnings": session.warnings().len(),
            "requires": session.required_version(),
            "overview_html": overview_html,
            "directories": directories,
            "categories": categories,
            "obsolete": session.obsolete(),
            "bugs": session.bugs(),
            "todos": session.todos(),
        });
        self.handlebars.render("index", &context).map_err(Into::into)
    }

    /// Render the page for one source file.
    pub fn render_file_page(
        &self,
        session: &BuildSession,
        _id: FileId,
        file: &SourceFile,
    ) -> Result<String> {
        let markup = self.markup_for(&file.markup);

        let routines: Vec<Value> = session
            .visible_routines(file)
            .map(|routine| routine_context(routine, markup))
            .collect();

        let comments_html = if file.docs.comments.is_empty() {
            None
        } else {
            Some(markup.render(&file.docs.comments))
        };

        let context = json!({
            "basename": file.basename,
            "directory": file.variable("directory"),
            "n_lines": file.n_lines,
            "format": file.doc_format,
            "markup": file.markup,
            "modification_time": file.variable("modification_time"),
            "comments_html": comments_html,
            "routines": routines,
            "version": crate::VERSION,
            "date": Utc::now().to_rfc2822(),
        });
        self.handlebars.render("file", &context).map_err(Into::into)
    }

    fn markup_for(&self, name: &str) -> &dyn MarkupRenderer {
        // Unknown names were already warned about during parsing.
        self.markup
            .get(name)
            .unwrap_or(&VerbatimMarkup as &dyn MarkupRenderer)
    }
}

/// A routine's calling sequence, reconstructed from its argument lists.
pub fn signature(routine: &Routine) -> String {
    let mut parts: Vec<String> = routine
        .parameters
        .iter()
        .map(|a| a.name.clone())
        .collect();
    parts.extend(
        routine
            .keywords
            .iter()
            .map(|a| format!("{}={}", a.name.to_uppercase(), a.name.to_lowercase())),
    );

    if routine.is_function {
        format!("result = {}({})", routine.name, parts.join(", "))
    } else if parts.is_empty() {
        routine.name.clone()
    } else {
        format!("{}, {}", routine.name, parts.join(", "))
    }
}

fn routine_context(routine: &Routine, markup: &dyn MarkupRenderer) -> Value {
    let argument = |a: &crate::core::model::Argument| {
        json!({
            "name": a.name,
            "attributes": a.attributes,
            "comments_html": markup.render(&a.comments),
        })
    };

    json!({
        "name": routine.name,
        "anchor": routine.variable("anchor"),
        // Pre-escaped: handlebars' default escaping would turn the `=` in
        // keyword assignments into an entity.
        "signature_html": escape_html(&signature(routine)),
        "is_obsolete": routine.is_obsolete,
        "is_abstract": routine.is_abstract,
        "comments_html": if routine.docs.comments.is_empty() {
            None
        } else {
            Some(markup.render(&routine.docs.comments))
        },
        "parameters": routine.parameters.iter().map(argument).collect::<Vec<_>>(),
        "keywords": routine.keywords.iter().map(argument).collect::<Vec<_>>(),
        "returns": routine.docs.returns,
        "examples": routine.docs.examples,
        "completeness": routine.variable("completeness"),
    })
}

fn write_text(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .map_err(|e| ProdocError::io(format!("Failed to write {}", path.display()), e))
}
