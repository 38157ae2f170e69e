//! Built-in ruleset.
//!
//! A representative default set covering the common credential families.
//! Deployments with their own configuration load `RuleSpec`s from JSON or
//! TOML instead and never touch this module.

use super::{RuleKind, RuleSpec, Severity};

fn rule(
    name: &str,
    kind: RuleKind,
    severity: Severity,
    confidence: f32,
    values: &[&str],
    filter_set: &str,
    use_ml: bool,
) -> RuleSpec {
    RuleSpec {
        name: name.into(),
        kind,
        severity,
        confidence,
        values: values.iter().map(|s| s.to_string()).collect(),
        filter_set: filter_set.into(),
        use_ml,
        required_substrings: vec![],
        min_line_len: 0,
    }
}

/// The default rules compiled into the scanner when no external
/// configuration is supplied.
pub fn builtin_rules() -> Vec<RuleSpec> {
    let mut rules = vec![
        rule(
            "Password",
            RuleKind::Keyword,
            Severity::Medium,
            0.5,
            &["pass", "pwd"],
            "GeneralKeyword",
            true,
        ),
        rule(
            "Secret",
            RuleKind::Keyword,
            Severity::Medium,
            0.6,
            &["secret"],
            "GeneralKeyword",
            true,
        ),
        rule(
            "API Key",
            RuleKind::Keyword,
            Severity::High,
            0.7,
            &["api"],
            "GeneralKeyword",
            true,
        ),
        rule(
            "Token",
            RuleKind::Keyword,
            Severity::Medium,
            0.5,
            &["token"],
            "GeneralKeyword",
            true,
        ),
        rule(
            "Auth Credential",
            RuleKind::Keyword,
            Severity::Medium,
            0.5,
            &["auth", "credential"],
            "GeneralKeyword",
            true,
        ),
    ];

    let mut aws = rule(
        "AWS Client ID",
        RuleKind::Pattern,
        Severity::High,
        0.9,
        &[r"(?P<value>(A3T[A-Z0-9]|AKIA|AGPA|AIDA|AROA|AIPA|ANPA|ANVA|ASIA)[A-Z0-9]{16,17})"],
        "GeneralPattern",
        false,
    );
    aws.required_substrings = vec!["a3t".into(), "aki".into(), "agp".into(), "aid".into()];
    aws.min_line_len = 20;
    rules.push(aws);

    let mut aws_multi = rule(
        "AWS Multi",
        RuleKind::Multi,
        Severity::Critical,
        0.9,
        &[
            r"(?P<value>AKIA[A-Z0-9]{16,17})",
            r"(?P<value>[0-9a-zA-Z/+]{40})",
        ],
        "GeneralPattern",
        false,
    );
    aws_multi.required_substrings = vec!["akia".into()];
    aws_multi.min_line_len = 20;
    rules.push(aws_multi);

    let mut github = rule(
        "GitHub Token",
        RuleKind::Pattern,
        Severity::High,
        0.95,
        &[r"(?P<value>(ghp|gho|ghu|ghs|ghr)_[0-9a-zA-Z]{36,255})"],
        "GeneralPattern",
        false,
    );
    github.required_substrings = vec!["gh".into()];
    github.min_line_len = 40;
    rules.push(github);

    let mut slack = rule(
        "Slack Token",
        RuleKind::Pattern,
        Severity::High,
        0.9,
        &[r"(?P<value>xox[abops]\-[0-9a-zA-Z\-]{10,250})"],
        "GeneralPattern",
        false,
    );
    slack.required_substrings = vec!["xox".into()];
    slack.min_line_len = 14;
    rules.push(slack);

    let mut jwt = rule(
        "JSON Web Token",
        RuleKind::Pattern,
        Severity::Medium,
        0.8,
        &[r"(?P<value>eyJ[A-Za-z0-9_=\-]{10,}\.[A-Za-z0-9_=\-]{10,}(\.[A-Za-z0-9_/+=\-]*)?)"],
        "GeneralPattern",
        false,
    );
    jwt.required_substrings = vec!["eyj".into()];
    jwt.min_line_len = 24;
    rules.push(jwt);

    let mut pem = rule(
        "PEM Private Key",
        RuleKind::PemKey,
        Severity::Critical,
        1.0,
        &[r"-----BEGIN\s(?P<value>[^-]*)PRIVATE\sKEY-----"],
        "",
        false,
    );
    pem.required_substrings = vec!["begin".into()];
    rules.push(pem);

    rules
}
