//! Interactive scatter of predictions as a standalone plotly HTML document

use crate::error::Result;
use crate::predict::{GenePrediction, PredictionTable};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tracing::info;

pub const DEFAULT_TITLE: &str = "scAmp Predictions";

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

fn scatter_trace<'a>(name: &str, rows: impl Iterator<Item = &'a GenePrediction>) -> Value {
    let (mut x, mut y, mut text) = (Vec::new(), Vec::new(), Vec::new());
    for row in rows {
        x.push(row.mean);
        y.push(row.var);
        text.push(row.gene.as_str());
    }
    json!({
        "type": "scatter",
        "mode": "markers",
        "name": name,
        "x": x,
        "y": y,
        "hovertext": text,
    })
}

fn axis(title: &str) -> Value {
    json!({ "title": { "text": title, "font": { "size": 18 } } })
}

/// Plotly figure: non-ecDNA and ecDNA genes, copy-number mean against variance
pub fn prediction_figure(table: &PredictionTable, title: Option<&str>) -> Value {
    let rows = table.rows();
    json!({
        "data": [
            scatter_trace("non-ecDNA", rows.iter().filter(|r| !r.pred)),
            scatter_trace("ecDNA", rows.iter().filter(|r| r.pred)),
        ],
        "layout": {
            "title": { "text": title.unwrap_or(DEFAULT_TITLE), "font": { "size": 25 } },
            "xaxis": axis("Copy-number Mean"),
            "yaxis": axis("Copy-number Variance"),
            "legend": { "font": { "size": 18, "color": "black" } },
        },
    })
}

/// Render the figure into an HTML document
pub fn render_html(figure: &Value) -> Result<String> {
    // `</` inside the inline script would close it early
    let payload = serde_json::to_string(figure)?.replace("</", "<\\/");
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<script src="{cdn}"></script>
</head>
<body>
<div id="scamp-predictions" style="width:100%;height:100vh;"></div>
<script>
const figure = {payload};
Plotly.newPlot("scamp-predictions", figure.data, figure.layout);
</script>
</body>
</html>
"#,
        cdn = PLOTLY_CDN,
        payload = payload
    ))
}

/// Write the prediction scatter to `path`
pub fn write_prediction_scatter<P: AsRef<Path>>(
    table: &PredictionTable,
    path: P,
    title: Option<&str>,
) -> Result<()> {
    let path = path.as_ref();
    let html = render_html(&prediction_figure(table, title))?;
    fs::write(path, html)?;
    info!("Wrote prediction plot to {:?}", path);
    Ok(())
}
