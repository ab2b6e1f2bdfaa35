use crate::layout::DashboardView;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Full HTML document for `view`.
///
/// With a session id the controls post changes back to the server and redraw
/// from the recomputed view; without one the page is a static snapshot and the
/// controls are disabled.
pub fn page(view: &DashboardView, session: Option<&str>) -> Result<String> {
    // "</" would end the inline script early
    let view_json = serde_json::to_string(view)?.replace("</", "<\\/");
    let session_json = serde_json::to_string(&session)?;

    // One pass over the template so substituted text is never rescanned.
    let mut out = String::with_capacity(TEMPLATE.len() + view_json.len());
    let mut rest = TEMPLATE;
    while let Some(start) = rest.find("__") {
        let tail = &rest[start..];
        let value = PLACEHOLDERS
            .iter()
            .find(|(name, _)| tail.starts_with(name))
            .map(|(name, slot)| {
                let text = match slot {
                    Slot::Title => escape_html(&view.title),
                    Slot::Plotly => PLOTLY_CDN.to_string(),
                    Slot::Session => session_json.clone(),
                    Slot::View => view_json.clone(),
                };
                (name.len(), text)
            });
        out.push_str(&rest[..start]);
        match value {
            Some((len, text)) => {
                out.push_str(&text);
                rest = &rest[start + len..];
            }
            None => {
                out.push_str("__");
                rest = &rest[start + 2..];
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

enum Slot {
    Title,
    Plotly,
    Session,
    View,
}

const PLACEHOLDERS: &[(&str, Slot)] = &[
    ("__TITLE__", Slot::Title),
    ("__PLOTLY__", Slot::Plotly),
    ("__SESSION__", Slot::Session),
    ("__VIEW__", Slot::View),
];

pub fn write_page(path: &Path, view: &DashboardView) -> Result<()> {
    let html = page(view, None)?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
    }
    fs::write(path, &html).with_context(|| format!("Failed to write page: {:?}", path))?;
    info!(path = ?path, bytes = html.len(), "Snapshot written");
    Ok(())
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>__TITLE__</title>
<script src="__PLOTLY__"></script>
<style>
  body { font-family: system-ui, sans-serif; margin: 0 auto; max-width: 1400px; padding: 1rem 2rem; color: #262730; }
  .row { display: grid; grid-template-columns: repeat(2, minmax(0, 1fr)); gap: 2rem; margin-bottom: 1rem; }
  .chart { height: 420px; }
  .error { padding: 1rem; background: #fdecea; color: #8a1c1c; border-radius: 4px; }
  label { display: block; font-size: 0.9rem; margin-bottom: 0.3rem; }
  select { width: 100%; padding: 0.4rem; }
  .slider input { width: 48%; }
  #status { color: #8a1c1c; min-height: 1.2rem; }
  footer { margin-top: 2rem; font-size: 0.85rem; color: #6b6b76; }
  hr { border: none; border-top: 1px solid #e6e6ea; margin: 1.5rem 0; }
</style>
</head>
<body>
<div id="app"></div>
<div id="status"></div>
<script>
const SESSION = __SESSION__;
let VIEW = __VIEW__;

function el(tag, attrs, text) {
  const node = document.createElement(tag);
  Object.entries(attrs || {}).forEach(([k, v]) => node.setAttribute(k, v));
  if (text !== undefined) node.textContent = text;
  return node;
}

async function post(path, body) {
  const status = document.getElementById('status');
  const res = await fetch(`/api/sessions/${SESSION}/${path}`, {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify(body),
  });
  if (res.ok) {
    status.textContent = '';
    VIEW = await res.json();
    draw(VIEW);
  } else {
    status.textContent = await res.text();
  }
}

function selector(content) {
  const box = el('div');
  box.appendChild(el('label', {}, content.label));
  const select = el('select');
  content.options.forEach(o => {
    const opt = el('option', { value: o }, o);
    if (o === content.selected) opt.selected = true;
    select.appendChild(opt);
  });
  select.disabled = SESSION === null;
  select.onchange = () => post('selection', { dimension: content.dimension, variable: select.value });
  box.appendChild(select);
  return box;
}

function slider(content) {
  const box = el('div', { class: 'slider' });
  const caption = el('label', {}, `${content.label}: ${content.value.min} - ${content.value.max}`);
  box.appendChild(caption);
  const inputs = ['min', 'max'].map(key => {
    const input = el('input', { type: 'range', min: content.bounds.min, max: content.bounds.max });
    input.value = content.value[key];
    input.disabled = SESSION === null;
    input.oninput = () => { caption.textContent = `${content.label}: ${inputs[0].value} - ${inputs[1].value}`; };
    input.onchange = () => post('age-range', { min: Number(inputs[0].value), max: Number(inputs[1].value) });
    box.appendChild(input);
    return input;
  });
  return box;
}

function mapChart(node, spec) {
  const trace = {
    type: 'scattermapbox',
    lat: spec.markers.map(m => m.latitude),
    lon: spec.markers.map(m => m.longitude),
    hovertext: spec.markers.map(m => m.province),
    customdata: spec.markers.map(m => m.hover.map(h => h.value)),
    hovertemplate: '<b>%{hovertext}</b><br>' +
      (spec.markers[0] ? spec.markers[0].hover.map((h, i) => `${h.label}=%{customdata[${i}]}`).join('<br>') : '') +
      '<extra></extra>',
    marker: { size: spec.markers.map(m => m.size), sizemode: 'area', sizeref: spec.sizeref, sizemin: 1 },
  };
  Plotly.newPlot(node, [trace], {
    mapbox: { style: spec.style, center: spec.center, zoom: spec.zoom },
    margin: { l: 0, r: 0, t: 0, b: 0 },
  }, { responsive: true });
}

function barChart(node, spec) {
  const vertical = spec.orientation === 'v';
  const trace = {
    type: 'bar',
    orientation: spec.orientation,
    x: vertical ? spec.categories : spec.values,
    y: vertical ? spec.values : spec.categories,
  };
  Plotly.newPlot(node, [trace], {
    xaxis: { title: vertical ? spec.category_label : spec.value_label },
    yaxis: { title: vertical ? spec.value_label : spec.category_label },
    margin: { t: 10 },
  }, { responsive: true });
}

function region(r) {
  const box = el('div');
  if (r.heading) box.appendChild(el('h3', {}, r.heading));
  const c = r.content;
  switch (c.type) {
    case 'selector': box.appendChild(selector(c)); break;
    case 'age_slider': box.appendChild(slider(c)); break;
    case 'map': { const n = el('div', { class: 'chart' }); box.appendChild(n); requestAnimationFrame(() => mapChart(n, c.spec)); break; }
    case 'bar': { const n = el('div', { class: 'chart' }); box.appendChild(n); requestAnimationFrame(() => barChart(n, c.spec)); break; }
    case 'error': box.appendChild(el('div', { class: 'error' }, c.message)); break;
  }
  return box;
}

function draw(view) {
  const app = document.getElementById('app');
  app.replaceChildren();
  app.appendChild(el('h1', {}, view.title));
  app.appendChild(el('p', {}, view.description));
  view.rows.forEach(row => {
    if (row.kind === 'divider') { app.appendChild(el('hr')); return; }
    const line = el('div', { class: 'row' });
    row.columns.forEach(r => line.appendChild(region(r)));
    app.appendChild(line);
  });
  app.appendChild(el('footer', {}, view.footer));
}

draw(VIEW);
</script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Selection;
    use crate::types::AgeRange;

    fn view(title: &str) -> DashboardView {
        DashboardView {
            title: title.to_string(),
            description: "</script><b>".to_string(),
            footer: "dummy data".to_string(),
            selection: Selection {
                province: "Count".to_string(),
                generation: "Count".to_string(),
                profession: "Count".to_string(),
                gender: "Count".to_string(),
                age_range: AgeRange::new(35, 50),
            },
            rows: vec![],
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_page_embeds_view_and_session() {
        let html = page(&view("Customers"), Some("abc123")).unwrap();
        assert!(html.contains("<title>Customers</title>"));
        assert!(html.contains(r#"const SESSION = "abc123";"#));
        assert!(html.contains(r#""footer":"dummy data""#));
        assert!(!html.contains("__VIEW__"));
    }

    #[test]
    fn test_page_cannot_close_script_early() {
        let html = page(&view("<Customers>"), None).unwrap();
        assert!(html.contains("<title>&lt;Customers&gt;</title>"));
        assert!(html.contains("const SESSION = null;"));
        assert!(html.contains(r#"<\/script><b>"#));
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn test_placeholder_text_in_title_is_kept_literal() {
        let html = page(&view("Report __VIEW__ __SESSION__"), Some("abc123")).unwrap();
        assert!(html.contains("<title>Report __VIEW__ __SESSION__</title>"));
        assert_eq!(html.matches(r#"const SESSION = "abc123";"#).count(), 1);
        assert_eq!(html.matches(r#""footer":"dummy data""#).count(), 1);
    }

    #[test]
    fn test_write_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("dashboard.html");
        write_page(&path, &view("Snapshot")).unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
    }
}
