//! CSS prefixing and minification with lightningcss.

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

/// Resolve browserslist queries into lightningcss targets.
pub fn resolve_targets(queries: &[String]) -> Result<Targets, String> {
    let browsers = Browsers::from_browserslist(queries.iter().map(String::as_str))
        .map_err(|e| e.to_string())?;
    Ok(Targets::from(browsers))
}

/// Add vendor prefixes for `targets`, then minify.
///
/// `filename` only appears in error messages.
pub fn optimize(source: &str, filename: &str, targets: Targets) -> Result<String, String> {
    let options = ParserOptions {
        filename: filename.to_string(),
        ..ParserOptions::default()
    };
    let mut stylesheet = StyleSheet::parse(source, options).map_err(|e| e.to_string())?;

    stylesheet
        .minify(MinifyOptions {
            targets: targets.clone(),
            ..MinifyOptions::default()
        })
        .map_err(|e| e.to_string())?;

    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(result.code)
}
