#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use paperharvest::{
    config::{Endpoints, HarvestConfig, HarvestScope, VenueRegistry},
    filter::KeywordFilter,
    harvest::{HarvestOptions, Harvester, RunPlan},
};
use std::path::PathBuf;
use std::time::Duration;
use wiremock::ResponseTemplate;

/// Configuration pointing every host at the mock server, with no pacing.
pub fn test_config(base: &str) -> HarvestConfig {
    HarvestConfig {
        endpoints: Endpoints::all_at(base),
        document_delay: Duration::ZERO,
        metadata_delay: Duration::ZERO,
        base_backoff: Duration::from_millis(10),
        connect_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(5),
        ..HarvestConfig::default()
    }
}

pub fn test_plan(
    venue: &str,
    scope: HarvestScope,
    config: HarvestConfig,
    keywords: &[&str],
    options: HarvestOptions,
) -> RunPlan {
    RunPlan {
        venue: VenueRegistry::builtin().lookup(venue).unwrap().clone(),
        scope,
        config,
        filter: KeywordFilter::new(keywords),
        options,
    }
}

pub fn test_harvester(plan: &RunPlan) -> Harvester {
    Harvester::from_plan(plan).unwrap()
}

pub fn lean_options(save_dir: PathBuf) -> HarvestOptions {
    HarvestOptions {
        save_dir,
        output: None,
        download_pdfs: true,
    }
}

pub fn years(years: &[&str]) -> HarvestScope {
    HarvestScope {
        years: years.iter().map(|y| y.to_string()).collect(),
        terms: Vec::new(),
    }
}

pub fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_bytes(body.as_bytes())
        .insert_header("Content-Type", "text/html; charset=utf-8")
}

pub fn pdf(pages: usize) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_bytes(build_pdf(pages))
        .insert_header("Content-Type", "application/pdf")
}

/// A minimal document with one line of text per page.
pub fn build_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for i in 0..pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Section {i}"))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
