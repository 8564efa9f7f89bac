//! Userdata rendering over embedded script templates.

use slicer_core::{Result, SlicerError};
use tera::{Context, Tera};

/// Render a template with the given context. Autoescaping is off: the
/// output is a shell script, not HTML.
pub fn render(template: &str, context: &Context) -> Result<String> {
    Tera::one_off(template, context, false).map_err(|e| SlicerError::Template(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_placeholders() {
        let mut ctx = Context::new();
        ctx.insert("db_user", "app");
        let out = render("createuser {{ db_user }}", &ctx).unwrap();
        assert_eq!(out, "createuser app");
    }

    #[test]
    fn missing_variable_is_an_error() {
        let ctx = Context::new();
        let err = render("token={{ k3s_token }}", &ctx).unwrap_err();
        assert!(matches!(err, SlicerError::Template(_)));
    }

    #[test]
    fn shell_syntax_passes_through() {
        let ctx = Context::new();
        let script = "#!/bin/bash\nset -euxo pipefail\necho \"${HOME}\" > /tmp/out\n";
        assert_eq!(render(script, &ctx).unwrap(), script);
    }
}
