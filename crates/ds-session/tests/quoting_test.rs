//! `quote` evaluated by a real bash must reproduce its input.

use std::process::Command;

use ds_session::{command_to_string, quote, ShellCommand};

fn bash_printf(literal: &str) -> Vec<u8> {
    let out = Command::new("/bin/bash")
        .arg("-c")
        .arg(format!("printf '%s' {literal}"))
        .output()
        .expect("bash available");
    assert!(out.status.success(), "bash failed for {literal:?}");
    out.stdout
}

#[test]
fn quote_round_trips_through_bash() {
    let control: String = (1u8..32).map(char::from).collect();
    let cases = [
        "",
        "plain",
        "it's a 'quoted' thing",
        "'",
        "''''",
        "$HOME `id` $(id) \\ \" ; | & * ? [ ] ~ # !",
        "line1\nline2\r\nline3\r",
        control.as_str(),
        "\t\x1b[31mred\x1b[0m",
        "锟斤拷烫烫烫 é ✓ 🦀",
        "-n",
    ];
    for case in cases {
        assert_eq!(
            bash_printf(&quote(case)),
            case.as_bytes(),
            "round trip failed for {case:?}"
        );
    }
}

#[test]
fn argv_round_trips_tokenwise() {
    let tokens = vec!["a b", "c'd", "$x", "\n", "", "*"];
    let cmd = ShellCommand::from(tokens.clone());
    let script = format!(
        "for t in {}; do printf '<%s>' \"$t\"; done",
        command_to_string(&cmd)
    );
    let out = Command::new("/bin/bash")
        .arg("-c")
        .arg(script)
        .output()
        .expect("bash available");
    let expected: String = tokens.iter().map(|t| format!("<{t}>")).collect();
    assert_eq!(String::from_utf8_lossy(&out.stdout), expected);
}
