/// Generate one argument struct per stored procedure plus the `ProcedureCall`
/// enum that tags them.
///
/// Each entry names the variant, the procedure's SQL name, and its parameters in
/// declared order as `field: RustType = "label"`. `Option<_>` marks a nullable
/// parameter; the label is the key the form layer uses for the value.
macro_rules! procedure_catalog {
    ($(
        $(#[$meta:meta])*
        $variant:ident => $sql_name:literal {
            $( $field:ident : $ty:ty = $label:literal ),* $(,)?
        }
    )*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq)]
            pub struct $variant {
                $( pub $field: $ty, )*
            }

            impl $variant {
                pub const NAME: &'static str = $sql_name;
                pub const PARAMS: &'static [&'static str] = &[$($label),*];

                fn from_positional(args: &[&serde_json::Value]) -> Result<Self, GatewayError> {
                    check_arity(Self::NAME, Self::PARAMS, args.len())?;
                    #[allow(unused_mut, unused_variables)]
                    let mut slots = args.iter().copied().zip(Self::PARAMS.iter().copied());
                    Ok(Self {
                        $( $field: {
                            let (value, label) = slots.next().ok_or_else(|| {
                                GatewayError::MalformedRequest(format!(
                                    "{}: missing argument {}", Self::NAME, $label
                                ))
                            })?;
                            <$ty as ProcedureArg>::from_json(value)
                                .map_err(|reason| bad_argument(Self::NAME, label, &reason))?
                        }, )*
                    })
                }

                /// Arguments in declared parameter order.
                #[must_use]
                pub fn into_args(self) -> Vec<RowValues> {
                    vec![$( ProcedureArg::into_row_value(self.$field) ),*]
                }
            }

            impl From<$variant> for ProcedureCall {
                fn from(call: $variant) -> Self {
                    ProcedureCall::$variant(call)
                }
            }
        )*

        /// A call to one of the known stored procedures, arguments typed and ordered.
        #[derive(Debug, Clone, PartialEq)]
        pub enum ProcedureCall {
            $( $variant($variant), )*
        }

        impl ProcedureCall {
            /// SQL names of every known procedure.
            pub const NAMES: &'static [&'static str] = &[$($sql_name),*];

            #[must_use]
            pub fn name(&self) -> &'static str {
                match self {
                    $( ProcedureCall::$variant(_) => $variant::NAME, )*
                }
            }

            /// Declared parameter labels of procedure `name`, if it is known.
            #[must_use]
            pub fn params_of(name: &str) -> Option<&'static [&'static str]> {
                match name {
                    $( $sql_name => Some($variant::PARAMS), )*
                    _ => None,
                }
            }

            fn from_positional(name: &str, args: &[&serde_json::Value]) -> Result<Self, GatewayError> {
                match name {
                    $( $sql_name => Ok(ProcedureCall::$variant($variant::from_positional(args)?)), )*
                    _ => Err(GatewayError::MalformedRequest(format!(
                        "unknown procedure: {name}"
                    ))),
                }
            }

            /// Arguments in declared parameter order.
            #[must_use]
            pub fn into_args(self) -> Vec<RowValues> {
                match self {
                    $( ProcedureCall::$variant(call) => call.into_args(), )*
                }
            }
        }
    };
}

pub(crate) use procedure_catalog;
