use std::fmt::Write as _;

use crate::config::{MAX_HORIZON, MIN_HORIZON};
use crate::errors::AppError;
use crate::models::{AccuracyMetrics, DatasetSummary, Forecast, KeyForecasts};

/// Sidebar controls
#[derive(Debug, Clone, Copy)]
pub struct DashboardParams {
    pub horizon: usize,
    pub show_components: bool,
    pub show_metrics: bool,
}

/// Everything the page needs, already computed
pub struct DashboardView<'a> {
    pub params: DashboardParams,
    pub summary: &'a DatasetSummary,
    pub forecast: &'a Forecast,
    pub key: &'a KeyForecasts,
    pub metrics: Option<&'a AccuracyMetrics>,
    pub forecast_chart: String,
    pub components_chart: Option<String>,
}

const STYLE: &str = r#"
:root { --green-dark: #0f5132; --green: #2f855a; --card: #ffffff; }
body { margin: 0; font-family: "Source Sans Pro", Arial, sans-serif; color: #111827;
  background: radial-gradient(circle at 5% 5%, #f4fff8 0%, #ecf8f1 28%, #f8fafc 100%); }
.layout { display: flex; min-height: 100vh; }
aside { width: 280px; padding: 1.2rem; background: linear-gradient(180deg, #f8fffb 0%, #eefaf3 100%);
  border-right: 1px solid #c8e6d5; color: #0b3d2a; }
main { flex: 1; padding: 1.5rem 2rem; }
.title-wrap { padding: 1.2rem 1.4rem; border-radius: 16px; color: #ffffff; margin-bottom: 1rem;
  background: linear-gradient(120deg, #0f5132 0%, #2f855a 100%); box-shadow: 0 10px 24px rgba(15, 81, 50, 0.28); }
.title-wrap h1 { margin: 0; font-size: 1.9rem; }
.title-wrap p { margin: 0.4rem 0 0 0; color: #ecfdf3; }
.about-box, .sidebar-help, .card { background: var(--card); border: 1px solid #d9efe2; border-radius: 14px;
  padding: 1rem 1.1rem; margin-top: 0.5rem; }
.about-box h3 { margin: 0 0 0.45rem 0; color: #14532d; }
.info { background: #e7f5ee; border-radius: 10px; padding: 0.8rem 1rem; margin: 1rem 0; }
.metrics { display: grid; grid-template-columns: repeat(3, 1fr); gap: 1rem; margin: 1rem 0; }
.metrics.two { grid-template-columns: repeat(2, 1fr); }
.metric { background: var(--card); border: 1px solid #d9efe2; border-left: 5px solid var(--green);
  padding: 0.7rem; border-radius: 12px; }
.metric .label { color: #374151; font-size: 0.9rem; }
.metric .value { color: #0f172a; font-size: 1.6rem; font-weight: 600; }
.metric .delta { color: #166534; font-size: 0.9rem; }
.metric .delta.inverse { color: #b91c1c; }
.columns { display: grid; grid-template-columns: 2fr 1fr; gap: 1.2rem; }
table { width: 100%; border-collapse: collapse; font-size: 0.9rem; background: var(--card); }
th, td { padding: 0.35rem 0.5rem; border-bottom: 1px solid #e6ecef; text-align: right; }
th:first-child, td:first-child { text-align: left; }
.download { display: inline-block; margin-top: 0.8rem; padding: 0.5rem 0.9rem; border-radius: 8px;
  border: 1px solid #2f855a; color: #166534; text-decoration: none; background: #ffffff; }
.caption { color: #374151; font-size: 0.85rem; }
hr { border: none; border-top: 1px solid #d1d5db; margin: 1.5rem 0; }
"#;

/// `1234567.8` -> `"1,234,568"`
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if negative && out != "0" {
        out.insert(0, '-');
    }
    out
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn metric(out: &mut String, label: &str, value: &str, delta: Option<(&str, bool)>) -> Result<(), std::fmt::Error> {
    write!(
        out,
        r#"<div class="metric"><div class="label">{}</div><div class="value">{}</div>"#,
        escape_html(label),
        escape_html(value)
    )?;
    if let Some((delta, inverse)) = delta {
        write!(
            out,
            r#"<div class="delta{}">{}</div>"#,
            if inverse { " inverse" } else { "" },
            escape_html(delta)
        )?;
    }
    out.push_str("</div>");
    Ok(())
}

fn sidebar(out: &mut String, params: &DashboardParams) -> Result<(), std::fmt::Error> {
    write!(
        out,
        r#"<aside><h2>Controles</h2>
<form method="get" action="/">
<label for="horizon">Horizon de prevision (mois): <output id="horizon-value">{h}</output></label><br>
<input type="range" id="horizon" name="horizon" min="{min}" max="{max}" value="{h}"
  oninput="document.getElementById('horizon-value').value = this.value"><br>
<input type="hidden" name="submitted" value="true">
<label><input type="checkbox" name="show_components" value="true"{c}> Afficher decomposition</label><br>
<label><input type="checkbox" name="show_metrics" value="true"{m}> Afficher metriques</label><br>
<button type="submit">Mettre a jour</button>
</form>
<div class="sidebar-help">
<p><b>Guide rapide</b></p>
<p>1) Choisis le nombre de mois a projeter.</p>
<p>2) Active/deactive les graphiques detailles.</p>
<p>3) Lis les indicateurs (pic, creux, MAE, MAPE).</p>
</div></aside>"#,
        h = params.horizon,
        min = MIN_HORIZON,
        max = MAX_HORIZON,
        c = if params.show_components { " checked" } else { "" },
        m = if params.show_metrics { " checked" } else { "" },
    )
}

fn header(out: &mut String) {
    out.push_str(
        r#"<div class="title-wrap">
<h1>&#127805; Prevision des prix du mais au Benin</h1>
<p>Visualisation interactive des prix historiques et previsions (FCFA/tonne).</p>
</div>
<div class="about-box">
<h3>A propos du projet</h3>
<ul>
<li><b>Objectif:</b> estimer l'evolution mensuelle du prix du mais au Benin pour aider la planification.</li>
<li><b>Donnees:</b> serie historique FAO (Producer Price LCU/tonne), nettoyee puis structuree en mensuel.</li>
<li><b>Modele:</b> tendance lineaire par morceaux, avec saisonnalites annuelles et semiannuelles.</li>
<li><b>Resultat:</b> projection future, intervalle d'incertitude et indicateurs de performance.</li>
</ul>
</div>
<div class="info">Ce dashboard prevoit le prix mensuel du mais au Benin. Utilise la barre laterale pour choisir l'horizon de prevision et afficher plus de details.</div>
<details><summary>Comment lire ce dashboard</summary>
<ul>
<li><b>Historique et previsions</b>: la courbe montre les prix observes puis la projection future.</li>
<li><b>Previsions cles</b>: pic et creux attendus sur l'horizon choisi.</li>
<li><b>Tableau</b>: prevision centrale avec bornes basse/haute (incertitude du modele).</li>
<li><b>Metriques</b>: MAE et MAPE resumant la precision sur les donnees historiques.</li>
<li><b>Source</b>: FAO Producer Prices (maize/corn, LCU/tonne, donnees mensuelles).</li>
</ul>
</details>"#,
    );
}

fn preview_table(out: &mut String, forecast: &Forecast) -> Result<(), std::fmt::Error> {
    out.push_str(
        "<table><thead><tr><th>Date</th><th>Prevision</th><th>Borne basse</th><th>Borne haute</th></tr></thead><tbody>",
    );
    for row in forecast.future() {
        write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            row.ds.format("%Y-%m-%d"),
            format_thousands(row.yhat),
            format_thousands(row.yhat_lower),
            format_thousands(row.yhat_upper)
        )?;
    }
    out.push_str("</tbody></table>");
    Ok(())
}

pub fn render_dashboard(view: &DashboardView<'_>) -> Result<String, AppError> {
    build_page(view).map_err(|e| AppError::Model(format!("Failed to render dashboard: {}", e)))
}

fn build_page(view: &DashboardView<'_>) -> Result<String, std::fmt::Error> {
    let mut out = String::with_capacity(64 * 1024);
    write!(
        out,
        r#"<!DOCTYPE html><html lang="fr"><head><meta charset="utf-8">
<title>Prevision Prix Mais Benin</title>
<script src="https://cdn.plot.ly/plotly-2.12.1.min.js"></script>
<style>{}</style></head><body><div class="layout">"#,
        STYLE
    )?;
    sidebar(&mut out, &view.params)?;
    out.push_str("<main>");
    header(&mut out);

    write!(
        out,
        r#"<p class="caption">Source de donnees: <code>{}</code></p>"#,
        escape_html(&view.summary.source_path)
    )?;

    out.push_str(r#"<div class="metrics">"#);
    metric(&mut out, "Observations historiques", &format_thousands(view.summary.observations as f64), None)?;
    metric(&mut out, "Date min", &view.summary.date_min.format("%Y-%m").to_string(), None)?;
    metric(&mut out, "Date max", &view.summary.date_max.format("%Y-%m").to_string(), None)?;
    out.push_str("</div>");

    out.push_str(r#"<div class="columns"><section><h3>Historique et previsions</h3>"#);
    out.push_str(&view.forecast_chart);
    if let Some(components) = &view.components_chart {
        out.push_str("<details><summary>Decomposition du modele</summary>");
        out.push_str(components);
        out.push_str("</details>");
    }
    out.push_str("</section><section><h3>Previsions cles</h3>");

    let peak_month = view.key.peak.ds.format("%b %Y").to_string();
    let trough_month = view.key.trough.ds.format("%b %Y").to_string();
    metric(
        &mut out,
        "Pic attendu",
        &format!("{} FCFA", format_thousands(view.key.peak.yhat)),
        Some((peak_month.as_str(), false)),
    )?;
    metric(
        &mut out,
        "Creux attendu",
        &format!("{} FCFA", format_thousands(view.key.trough.yhat)),
        Some((trough_month.as_str(), true)),
    )?;

    preview_table(&mut out, view.forecast)?;
    write!(
        out,
        r#"<a class="download" href="/api/forecast/csv?horizon={}" download>Telecharger previsions (CSV)</a>"#,
        view.params.horizon
    )?;
    out.push_str("</section></div>");

    if let Some(metrics) = view.metrics {
        out.push_str(r#"<hr><h3>Performance du modele sur historique</h3><div class="metrics two">"#);
        metric(&mut out, "MAE", &format!("{} FCFA/tonne", format_thousands(metrics.mae)), None)?;
        metric(&mut out, "MAPE", &format!("{:.1} %", metrics.mape_pct), None)?;
        out.push_str("</div>");
    }

    out.push_str(
        r#"<hr><p class="caption">Donnees: FAO Producer Prices | Modele: tendance + saisonnalites | Dashboard: Rust</p>
</main></div></body></html>"#,
    );
    Ok(out)
}
