//! Integration tests for sheetform-doc-html

use pretty_assertions::assert_eq;
use sheetform::{FormSession, QuestionSource, SurveyId, parse_questions};
use sheetform_doc_html::{HtmlOptions, render, to_html, to_html_with_options};

const SHEET: &str = "\
section,order,key,label,type,options,required,placeholder,help
Your home,2,rent,Monthly rent,number,,TRUE,e.g. 950,In euros
Your home,1,kind,Type of home,radio,Flat|House,TRUE,,
About you,1,happy,Are you happy with your landlord?,yesno,,TRUE,,
About you,2,notes,Anything else?,textarea,,,,
";

fn form() -> FormSession {
    FormSession::new(
        SurveyId::Tenant,
        QuestionSource::LocalOverride,
        parse_questions(SHEET).unwrap(),
    )
}

#[test]
fn test_full_document() {
    let html = to_html(&form(), Some("Tenant <survey>"));

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Tenant &lt;survey&gt;</title>"));
    assert!(html.contains("<style>"));
    assert!(html.trim_end().ends_with("</html>"));
}

#[test]
fn test_sections_and_numbering() {
    let html = to_html_with_options(&form(), &HtmlOptions::new().full_document(false));

    let about = html.find("<h2 class=\"survey-section-title\">About you</h2>").unwrap();
    let home = html.find("<h2 class=\"survey-section-title\">Your home</h2>").unwrap();
    assert!(about < home);

    // Numbering restarts in every section
    assert!(html.contains("<legend>1. Are you happy with your landlord? *</legend>"));
    assert!(html.contains("<label for=\"notes\">2. Anything else?</label>"));
    assert!(html.contains("<legend>1. Type of home *</legend>"));
    assert!(html.contains("<label for=\"rent\">2. Monthly rent *</label>"));

    assert!(html.contains("id=\"happy-yes\" name=\"happy\" value=\"yes\""));
    assert!(html.contains("id=\"kind-house\" name=\"kind\" value=\"house\""));
    assert!(html.contains("<textarea id=\"notes\" name=\"notes\" rows=\"4\""));
}

#[test]
fn test_errors_follow_validation() {
    let mut form = form();
    form.set_answer("rent", "cheap");
    form.set_answer("kind", "HOUSE");
    assert!(form.validate().is_err());

    let options = HtmlOptions::new().full_document(false).with_class_prefix("tf");
    let html = to_html_with_options(&form, &options);

    assert!(html.contains("<p id=\"rent-error\" class=\"tf-error\" role=\"alert\">Must be a number</p>"));
    assert!(html.contains("<p id=\"happy-error\" class=\"tf-error\" role=\"alert\">Required</p>"));
    assert!(!html.contains("kind-error"));
    assert!(html.contains("id=\"kind-house\" name=\"kind\" value=\"house\" checked"));
}

#[test]
fn test_rendering_is_pure() {
    let form = form();
    let options = HtmlOptions::new();
    assert_eq!(
        render(form.sections(), form.answers(), None, &options),
        render(form.sections(), form.answers(), None, &options)
    );
    assert_eq!(
        to_html_with_options(&form, &options),
        render(form.sections(), form.answers(), None, &options)
    );
}
