/// Configuration macros for zero-repetition config definitions
///
/// `config_struct!` defines a configuration struct with each field's default
/// next to its declaration, and generates:
/// - the struct with public fields
/// - the `Default` implementation
/// - serde support with `#[serde(default)]`, so partial TOML files load
///
/// # Example
/// ```
/// indexboard::config_struct! {
///     pub struct SchedulerConfig {
///         enabled: bool = true,
///         interval_secs: u64 = 60,
///     }
/// }
/// ```
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
