use std::collections::HashSet;

use fmscript::StepKind;
use fmxml::{ComposeError, DecodedStep};

fn compose_xml(source: &str) -> String {
    fmxml::compose(source).expect("compose failed").xml
}

fn round_trip(source: &str) -> String {
    fmxml::decompile(&compose_xml(source)).expect("decompile failed")
}

fn structural_errors(source: &str) -> Vec<String> {
    match fmxml::compose(source) {
        Err(ComposeError::Structure(result)) => result.errors.iter().map(|e| e.to_string()).collect(),
        Err(other) => panic!("expected structural errors, got {other}"),
        Ok(_) => Vec::new(),
    }
}

const FULL_SCRIPT: &str = r#"Set Error Capture [ On ]
Allow User Abort [ Off ]
# Fetch the order list
# and store it
Set Variable [ $url ; Value: "https://example.com/orders?id=" & $id ]
Set Variable [ $row[2] ; Value: 0 ]
Insert from URL [ Select ; With dialog: Off ; Target: $response ; URL: $url ; Verify SSL Certificates ; cURL: "-X GET" ]
If [ IsEmpty ( $response ) ]
    Show Custom Dialog [ "Error" ; "Nothing returned" ; "OK" ; "Retry" ]
    Exit Script [ False ]
Else If [ Left ( $response ; 1 ) = "<" ]
    Halt Script
Else
    Set Field By Name [ "Orders::Raw" ; $response ]
End If
Go to Layout [ "Orders" ]
New Record/Request
Set Field [ Orders::Payload ; $response ]
Commit Records [ No dialog ]
Enter Find Mode [ Pause ]
Perform Find
Sort Records [ No dialog ]
Go to Record/Request/Page [ First ]
Loop
    Exit Loop If [ Get ( RecordNumber ) = Get ( FoundCount ) ]
    Insert Text [ Select All ; Target: $log ; "done" ]
    Go to Record/Request/Page [ Next ]
End Loop
Perform Script [ "Notify" ; $id ]
New Window [ Name: "Report" ; Layout: "Orders" ; Style: Document ]
Adjust Window [ Maximize ]
Refresh Window
Configure LLM Template [ Template: "Summary" ; Provider: OpenAI ]
LLM Request [ Action: Generate ; Model: "gpt-4o" ; Prompt: $prompt ; Target: Orders::Summary ; Stream: On ]
// Go to Layout [ original layout ]"#;

#[test]
fn full_script_covers_every_kind() {
    let composed = fmxml::compose(FULL_SCRIPT).unwrap();
    let kinds: HashSet<StepKind> = composed.steps.iter().map(|s| s.kind()).collect();
    assert_eq!(kinds.len(), StepKind::ALL.len());
}

#[test]
fn canonical_text_survives_compose_and_decompile() {
    assert_eq!(round_trip(FULL_SCRIPT), FULL_SCRIPT);
}

#[test]
fn decompile_is_idempotent() {
    let once = round_trip(FULL_SCRIPT);
    assert_eq!(round_trip(&once), once);
}

#[test]
fn loose_input_is_canonicalized() {
    let source = "set error capture [on]\n\ncommit records/requests\nGo to Record [ next ]\nnew record\nPerform Find [ ]\nEnter Find Mode [ Pause: Off ]";
    assert_eq!(
        round_trip(source),
        "Set Error Capture [ On ]\nCommit Records\nGo to Record/Request/Page [ Next ]\nNew Record/Request\nPerform Find\nEnter Find Mode"
    );
}

#[test]
fn continuation_lines_fold_into_one_calculation() {
    let xml = compose_xml("Set Variable [ $x ; Value: (1+\n2) ]");
    assert!(xml.contains("<Value><Calculation><![CDATA[(1+ 2)]]></Calculation></Value>"));
    assert_eq!(fmxml::decompile(&xml).unwrap(), "Set Variable [ $x ; Value: (1+ 2) ]");
}

#[test]
fn comments_merge_and_split_again() {
    let xml = compose_xml("# a\n# b\n# c");
    assert!(xml.contains("<Text>a&#10;b&#10;c</Text>"));
    assert_eq!(xml.matches("<Step ").count(), 1);
    assert_eq!(fmxml::decompile(&xml).unwrap(), "# a\n# b\n# c");
}

#[test]
fn dialog_has_three_button_slots() {
    let xml = compose_xml(r#"Show Custom Dialog [ "T" ; "M" ; "OK" ; "Cancel" ]"#);
    assert_eq!(xml.matches("<Button>").count(), 3);
    assert!(xml.contains("<Button></Button></Buttons>"));
}

#[test]
fn dialog_without_buttons_gets_ok() {
    let xml = compose_xml(r#"Show Custom Dialog [ "Done" ; "All records updated" ]"#);
    assert!(xml.contains(r#"<Button><Calculation><![CDATA["OK"]]></Calculation></Button><Button></Button><Button></Button>"#));
}

#[test]
fn mismatched_closer_is_reported_once_and_block_stays_open() {
    let errors = structural_errors("If [ x = 1 ]\nEnd Loop");
    let mismatches: Vec<&str> = errors
        .iter()
        .map(String::as_str)
        .filter(|e| e.contains("found but current open block"))
        .collect();
    assert_eq!(
        mismatches,
        vec!["Line 2: End Loop found but current open block is If (opened line 1)"]
    );
    assert_eq!(errors.last().map(String::as_str), Some("Line 1: Unclosed If (missing End If)"));
}

#[test]
fn correct_closer_after_a_mismatch_is_accepted() {
    assert_eq!(
        structural_errors("If [ a ]\nLoop\nEnd If\nEnd Loop"),
        vec![
            "Line 3: End If found but current open block is Loop (opened line 2)",
            "Line 1: Unclosed If (missing End If)",
        ]
    );
}

#[test]
fn every_open_frame_is_reported() {
    assert_eq!(
        structural_errors("Loop\n  If [ a ]\n    If [ b ]\n    End If"),
        vec![
            "Line 1: Unclosed Loop (missing End Loop)",
            "Line 2: Unclosed If (missing End If)",
        ]
    );
}

#[test]
fn recognition_errors_are_collected() {
    let Err(ComposeError::Recognition(errors)) = fmxml::compose("Beep\nLoop\nSpeak [ \"hi\" ]\nEnd Loop") else {
        panic!("expected recognition errors");
    };
    let lines: Vec<usize> = errors.iter().map(|e| e.line).collect();
    assert_eq!(lines, vec![1, 3]);
}

#[test]
fn disabled_steps_round_trip() {
    let source = "Loop\n    // Exit Loop If [ 1 ]\nEnd Loop";
    let xml = compose_xml(source);
    assert!(xml.contains(r#"<Step enable="False" id="72" name="Exit Loop If">"#));
    assert_eq!(fmxml::decompile(&xml).unwrap(), source);
}

#[test]
fn special_characters_survive() {
    let source = r#"If [ $a < 1 and $b > 2 and $c & "]]>" = "x" ]
    Insert Text [ "<b>bold & brave</b>" ]
End If
# Ampersands & "quotes" <tags>"#;
    assert_eq!(round_trip(source), source);
}

#[test]
fn insert_text_with_quote_and_backslash_recomposes() {
    let xml = r#"<fmxmlsnippet type="FMObjectList"><Step enable="True" id="61" name="Insert Text"><Text>12&quot; ruler \</Text></Step><Step enable="True" id="90" name="Halt Script"></Step></fmxmlsnippet>"#;
    let text = fmxml::decompile(xml).unwrap();
    assert_eq!(text, "Insert Text [ \"12\\\" ruler \\\\\" ]\nHalt Script");

    let composed = fmxml::compose(&text).unwrap();
    assert_eq!(composed.steps.len(), 2);
    assert!(composed.xml.contains(r#"12&quot; ruler \</"#));
    assert_eq!(fmxml::decompile(&composed.xml).unwrap(), text);
}

#[test]
fn decompiles_filemaker_clipboard() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<fmxmlsnippet type="FMObjectList">
  <Step enable="True" id="1" name="Perform Script">
    <CurrentScript value="Pause"></CurrentScript>
    <Calculation><![CDATA[ $param ]]></Calculation>
    <Script id="42" name="Send Invoice"></Script>
  </Step>
  <Step enable="True" id="93" name="Beep"></Step>
  <Step enable="True" id="76" name="Set Field">
    <Calculation><![CDATA[Get ( CurrentTimestamp )]]></Calculation>
    <Field table="Invoices" id="7" name="SentAt"></Field>
  </Step>
</fmxmlsnippet>"#;
    assert_eq!(
        fmxml::decompile(xml).unwrap(),
        "Perform Script [ \"Send Invoice\" ; $param ]\nBeep [id=93]\nSet Field [ Invoices::SentAt ; Get ( CurrentTimestamp ) ]"
    );
}

#[test]
fn read_snippet_reports_unknown_steps() {
    let xml = r#"<fmxmlsnippet type="FMObjectList"><Step enable="False" id="93" name="Beep"></Step></fmxmlsnippet>"#;
    let steps = fmxml::read_snippet(xml).unwrap();
    assert_eq!(
        steps,
        vec![DecodedStep::Unrecognized {
            id: "93".into(),
            name: "Beep".into(),
            enabled: false,
        }]
    );
    assert_eq!(fmxml::decompile(xml).unwrap(), "// Beep [id=93]");
}

#[test]
fn empty_input_composes_to_empty_snippet() {
    let composed = fmxml::compose("").unwrap();
    assert_eq!(composed.warnings[0].message, "No steps found (is the input empty?)");
    assert_eq!(fmxml::decompile(&composed.xml).unwrap(), "");
}
