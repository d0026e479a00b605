//! JS code executed in a browser.

use serde_json::Value as Json;

/// Representation of the JS code which can be executed in a browser.
///
/// Expression must be an async lambda without parameters. Arguments of the
/// [`Statement`] are provided to it as `args` array.
///
/// Example of JS expression:
///
/// ```js
/// async () => {
///     const [selector] = args;
///     // ...
///
///     return "foobar";
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Statement {
    /// Actual JS code to execute.
    expression: String,

    /// Arguments for the [`Statement::expression`] which will be provided
    /// as `args` array.
    args: Vec<Json>,
}

impl Statement {
    /// Returns new [`Statement`] with a provided JS code and arguments.
    #[inline]
    #[must_use]
    pub fn new(expression: &str, args: Vec<Json>) -> Self {
        Self {
            expression: expression.to_owned(),
            args,
        }
    }

    /// Returns JS code of this [`Statement`] wrapped to be run by an async
    /// WebDriver script, and the arguments for it.
    ///
    /// Script result is reported via the last argument callback as a
    /// `{ ok: value }` or `{ err: reason }` object.
    pub(super) fn prepare(self) -> (String, Vec<Json>) {
        // language=JavaScript
        let js = format!(
            r#"
            (
                async () => {{
                    let callback = arguments[arguments.length - 1];
                    try {{
                        const args = arguments[0];
                        let lastResult = await ({expression})();
                        if (lastResult === undefined) {{
                            lastResult = null;
                        }}
                        callback({{ ok: lastResult }});
                    }} catch (e) {{
                        callback({{ err: e.toString() }});
                    }}
                }}
            )();
            "#,
            expression = self.expression,
        );

        (js, vec![Json::Array(self.args)])
    }
}
