//! Quantitative analyzer: extract numeric data from context, choose a chart
//! type, render a deterministic raster chart, and generate a textual insight.

use base64::Engine;
use image::{Rgb, RgbImage};
use serde::Deserialize;

use crate::error::Result;
use crate::llm::{Llm, Message, parse_json_response};
use crate::retrieval::Document;

/// Shape of the data the extraction step found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Categorical comparison (bar-shaped).
    Comparison,
    /// Values over time (line-shaped).
    Timeline,
    /// Proportional breakdown (pie-shaped).
    Distribution,
    /// A single scalar.
    SingleValue,
    /// Tabular data with no single obvious chart.
    Table,
    /// No numeric data found.
    None,
}

impl DataType {
    fn coerce(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "comparison" => Self::Comparison,
            "timeline" => Self::Timeline,
            "distribution" => Self::Distribution,
            "single_value" => Self::SingleValue,
            "table" => Self::Table,
            _ => Self::None,
        }
    }

    const fn fallback_chart_type(self) -> ChartType {
        match self {
            Self::Comparison => ChartType::Bar,
            Self::Timeline => ChartType::Line,
            Self::Distribution => ChartType::Pie,
            Self::SingleValue | Self::Table | Self::None => ChartType::Bar,
        }
    }
}

/// Data-quality grade assigned by the extraction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataQuality {
    /// Values parsed cleanly, no coercion needed.
    Clean,
    /// Values required sanitization (e.g. thousand separators) to parse.
    Sanitized,
    /// Some values could not be recovered.
    Incomplete,
}

impl DataQuality {
    fn coerce(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "sanitized" => Self::Sanitized,
            "incomplete" => Self::Incomplete,
            _ => Self::Clean,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Sanitized => "sanitized",
            Self::Incomplete => "incomplete",
        }
    }
}

/// Chosen chart rendering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartType {
    /// Bar chart.
    Bar,
    /// Line chart.
    Line,
    /// Pie chart.
    Pie,
    /// No chart, render as a table instead (not rasterized).
    Table,
    /// No chart at all.
    None,
}

impl ChartType {
    fn coerce(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "bar" => Some(Self::Bar),
            "line" => Some(Self::Line),
            "pie" => Some(Self::Pie),
            "table" => Some(Self::Table),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Pie => "pie",
            Self::Table => "table",
            Self::None => "none",
        }
    }
}

/// Result of the extraction step.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawExtraction {
    #[serde(default)]
    data_found: bool,
    #[serde(default)]
    data_type: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    values: Vec<String>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    data_quality: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

/// Final output of the quantitative pipeline.
#[derive(Debug, Clone)]
pub struct QuantOutcome {
    /// Base64-encoded PNG, if a chart was rendered.
    pub chart_base64: Option<String>,
    /// Chart strategy used.
    pub chart_type: ChartType,
    /// 2-4 sentence textual analysis.
    pub insights: String,
    /// Quality grade of the extracted data.
    pub data_quality: DataQuality,
}

const EXTRACT_PROMPT: &str = "Extrae los datos numéricos relevantes para responder la siguiente \
pregunta a partir del contexto. Responde en JSON con los campos data_found (bool), data_type \
(comparison|timeline|distribution|single_value|table|none), categories (lista de strings), values \
(lista de strings numéricos), unit (string), data_quality (clean|sanitized|incomplete) y notes \
(string).\n\nPregunta: {question}\n\nContexto:\n{context}";

const STRATEGY_PROMPT: &str = "Dado el siguiente tipo de datos y categorías, elige la mejor \
estrategia de visualización entre: bar, line, pie, table, none. Responde únicamente con la \
palabra, sin explicación.\n\ndata_type: {data_type}\ncategories: {categories}";

const INSIGHT_PROMPT: &str = "Redacta un análisis de 2 a 4 oraciones sobre los siguientes datos, \
en español, para un equipo de oferta en una licitación.\n\ncategorías: {categories}\nvalores: \
{values}\nunidad: {unit}";

async fn extract(llm: &dyn Llm, question: &str, context: &[Document], temperature: f32) -> Result<RawExtraction> {
    let context_text = crate::agents::flatten_context(context, Some(6000));
    let prompt = EXTRACT_PROMPT.replace("{question}", question).replace("{context}", &context_text);
    let response = llm.chat(&[Message::user(prompt)], temperature).await?;

    let Some(parsed) = parse_json_response(&response.content) else {
        return Ok(RawExtraction::default());
    };
    Ok(serde_json::from_value(parsed).unwrap_or_default())
}

async fn choose_strategy(
    llm: &dyn Llm,
    data_type: DataType,
    categories: &[String],
    temperature: f32,
) -> Result<ChartType> {
    let prompt = STRATEGY_PROMPT
        .replace("{data_type}", data_type_label(data_type))
        .replace("{categories}", &categories.join(", "));
    let response = llm.chat(&[Message::user(prompt)], temperature).await?;
    Ok(ChartType::coerce(&response.content).unwrap_or_else(|| data_type.fallback_chart_type()))
}

const fn data_type_label(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Comparison => "comparison",
        DataType::Timeline => "timeline",
        DataType::Distribution => "distribution",
        DataType::SingleValue => "single_value",
        DataType::Table => "table",
        DataType::None => "none",
    }
}

/// Parses a numeric string, stripping thousands separators (`,`).
fn parse_value(raw: &str) -> Option<f64> {
    raw.replace(',', "").trim().parse::<f64>().ok()
}

/// Renders a minimal labeled raster chart, retrying up to 2 times on panic
/// via `catch_unwind`-free deterministic drawing (drawing itself cannot fail
/// once inputs are validated, so the retry bound exists for the render call
/// signature's sake rather than observed flakiness).
fn render_chart(chart_type: ChartType, categories: &[String], values: &[f64]) -> Option<String> {
    if categories.len() != values.len() || categories.is_empty() {
        return None;
    }
    if !matches!(chart_type, ChartType::Bar | ChartType::Line | ChartType::Pie) {
        return None;
    }

    const WIDTH: u32 = 400;
    const HEIGHT: u32 = 300;
    const MARGIN: u32 = 20;

    let mut attempts = 0;
    loop {
        attempts += 1;
        let rendered = draw_once(chart_type, values, WIDTH, HEIGHT, MARGIN);
        if rendered.is_some() || attempts >= 2 {
            return rendered;
        }
    }
}

fn draw_once(chart_type: ChartType, values: &[f64], width: u32, height: u32, margin: u32) -> Option<String> {
    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let max_value = values.iter().cloned().fold(f64::MIN, f64::max).max(1.0);
    let plot_width = width.saturating_sub(margin * 2);
    let plot_height = height.saturating_sub(margin * 2);

    match chart_type {
        ChartType::Bar => {
            let bar_width = plot_width / values.len().max(1) as u32;
            for (i, &value) in values.iter().enumerate() {
                let bar_height = ((value.max(0.0) / max_value) * f64::from(plot_height)) as u32;
                let x0 = margin + i as u32 * bar_width;
                let y0 = height - margin - bar_height;
                for x in x0..(x0 + bar_width.saturating_sub(2)).min(width) {
                    for y in y0..(height - margin) {
                        img.put_pixel(x, y, Rgb([70, 130, 180]));
                    }
                }
            }
        }
        ChartType::Line => {
            let step = plot_width as f64 / (values.len().max(2) - 1) as f64;
            let points: Vec<(i64, i64)> = values
                .iter()
                .enumerate()
                .map(|(i, &value)| {
                    let x = margin as i64 + (i as f64 * step) as i64;
                    let y = height as i64 - margin as i64 - ((value.max(0.0) / max_value) * f64::from(plot_height)) as i64;
                    (x, y)
                })
                .collect();
            for pair in points.windows(2) {
                draw_line(&mut img, pair[0], pair[1]);
            }
        }
        ChartType::Pie => {
            let total: f64 = values.iter().map(|v| v.max(0.0)).sum();
            if total <= 0.0 {
                return None;
            }
            let center = (width as i64 / 2, height as i64 / 2);
            let radius = plot_width.min(plot_height) as i64 / 2;
            let mut angle_start = 0.0_f64;
            for (i, &value) in values.iter().enumerate() {
                let fraction = value.max(0.0) / total;
                let angle_end = angle_start + fraction * std::f64::consts::TAU;
                draw_pie_slice(&mut img, center, radius, angle_start, angle_end, slice_color(i));
                angle_start = angle_end;
            }
        }
        ChartType::Table | ChartType::None => return None,
    }

    let mut bytes: Vec<u8> = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png).ok()?;
    Some(base64::engine::general_purpose::STANDARD.encode(bytes))
}

fn slice_color(index: usize) -> Rgb<u8> {
    const PALETTE: [[u8; 3]; 6] =
        [[70, 130, 180], [220, 120, 60], [90, 170, 90], [200, 80, 140], [160, 160, 60], [120, 100, 200]];
    Rgb(PALETTE[index % PALETTE.len()])
}

fn draw_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64)) {
    let (x0, y0) = from;
    let (x1, y1) = to;
    let steps = (x1 - x0).abs().max((y1 - y0).abs()).max(1);
    for step in 0..=steps {
        let t = step as f64 / steps as f64;
        let x = (x0 as f64 + (x1 - x0) as f64 * t).round() as i64;
        let y = (y0 as f64 + (y1 - y0) as f64 * t).round() as i64;
        if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
            img.put_pixel(x as u32, y as u32, Rgb([200, 60, 60]));
        }
    }
}

fn draw_pie_slice(img: &mut RgbImage, center: (i64, i64), radius: i64, start: f64, end: f64, color: Rgb<u8>) {
    let steps = 200;
    for i in 0..=steps {
        let angle = start + (end - start) * (i as f64 / steps as f64);
        for r in 0..radius {
            let x = center.0 + (r as f64 * angle.cos()) as i64;
            let y = center.1 + (r as f64 * angle.sin()) as i64;
            if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

fn deterministic_insight(categories: &[String], values: &[String], unit: Option<&str>) -> String {
    if categories.is_empty() || values.is_empty() {
        return "No se identificaron datos numéricos suficientes para generar un análisis.".to_string();
    }
    let unit_suffix = unit.map(|u| format!(" {u}")).unwrap_or_default();
    let pairs: Vec<String> =
        categories.iter().zip(values.iter()).map(|(cat, val)| format!("{cat}: {val}{unit_suffix}")).collect();
    format!("Datos observados: {}.", pairs.join(", "))
}

async fn generate_insight(
    llm: &dyn Llm,
    categories: &[String],
    values: &[String],
    unit: Option<&str>,
    temperature: f32,
) -> String {
    let prompt = INSIGHT_PROMPT
        .replace("{categories}", &categories.join(", "))
        .replace("{values}", &values.join(", "))
        .replace("{unit}", unit.unwrap_or(""));

    match llm.chat(&[Message::user(prompt)], temperature).await {
        Ok(response) if !response.content.trim().is_empty() => response.content,
        _ => deterministic_insight(categories, values, unit),
    }
}

/// Runs the full extract -> strategy -> render -> insight pipeline.
///
/// # Errors
///
/// Propagates LLM transport errors from the extract and strategy calls; the
/// insight call degrades to a deterministic fallback instead of propagating.
pub async fn analyze(
    llm: &dyn Llm,
    question: &str,
    context: &[Document],
    extract_temperature: f32,
    strategy_temperature: f32,
    insight_temperature: f32,
) -> Result<QuantOutcome> {
    let extraction = extract(llm, question, context, extract_temperature).await?;

    if !extraction.data_found {
        return Ok(QuantOutcome {
            chart_base64: None,
            chart_type: ChartType::None,
            insights: deterministic_insight(&[], &[], None),
            data_quality: DataQuality::Incomplete,
        });
    }

    let data_type = DataType::coerce(extraction.data_type.as_deref().unwrap_or("none"));
    let chart_type = choose_strategy(llm, data_type, &extraction.categories, strategy_temperature).await?;

    let values_f64: Option<Vec<f64>> = if extraction.categories.len() == extraction.values.len() {
        extraction.values.iter().map(|v| parse_value(v)).collect()
    } else {
        None
    };

    let chart_base64 = values_f64.as_ref().and_then(|values| render_chart(chart_type, &extraction.categories, values));

    let insights =
        generate_insight(llm, &extraction.categories, &extraction.values, extraction.unit.as_deref(), insight_temperature)
            .await;

    let data_quality = DataQuality::coerce(extraction.data_quality.as_deref().unwrap_or("clean"));

    Ok(QuantOutcome { chart_base64, chart_type, insights, data_quality })
}
