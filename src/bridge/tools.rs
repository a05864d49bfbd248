use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::ai::{internal_error, FunctionCall, FunctionDeclaration, FunctionResponse, Schema, Tool};
use crate::bridge::error::{BridgeError, BridgeResult};
use crate::bridge::logger::LOGGER;
use crate::logger::LogArgument;

pub const FIND_POSTS_BY_CATEGORY: &str = "findPostsByCategory";

const PLACEHOLDER_TITLE: &str = "some nodejs post";
const PLACEHOLDER_URL: &str = "https://codesilva.github.io";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub title: String,
    pub url: String,
}

/// Payload returned to the model as the function response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSearchResult {
    pub posts: Vec<BlogPost>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindPostsByCategoryArgs {
    pub category: Vec<String>,
}

/// Mock blog search.
///
/// Any request naming the `java` category (exact match) finds nothing; every
/// other request gets the same three placeholder posts.
pub fn find_posts_by_category(args: &FindPostsByCategoryArgs) -> PostSearchResult {
    LOGGER.debug_with([
        LogArgument::from("searching posts by category"),
        LogArgument::from(json!({ "category": args.category })),
    ]);

    if args.category.iter().any(|category| category == "java") {
        return PostSearchResult::default();
    }

    PostSearchResult {
        posts: (0..3)
            .map(|_| BlogPost {
                title: PLACEHOLDER_TITLE.to_string(),
                url: PLACEHOLDER_URL.to_string(),
            })
            .collect(),
    }
}

pub fn find_posts_declaration() -> FunctionDeclaration {
    FunctionDeclaration {
        name: FIND_POSTS_BY_CATEGORY.to_string(),
        description: "Find posts by category".to_string(),
        parameters: Some(
            Schema::object([(
                "category",
                Schema::array(Schema::string())
                    .with_description("The categories for searching blog post"),
            )])
            .with_required(["category"]),
        ),
    }
}

/// Tools handed to the model.
pub fn tool_declarations() -> Vec<Tool> {
    vec![Tool {
        function_declarations: vec![find_posts_declaration()],
    }]
}

/// The function calls this bridge knows how to execute.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolCall {
    FindPostsByCategory {
        id: Option<String>,
        args: FindPostsByCategoryArgs,
    },
}

impl ToolCall {
    /// Resolves a model function call, checking its arguments against the
    /// declared parameter schema.
    pub fn from_function_call(call: &FunctionCall) -> BridgeResult<Self> {
        match call.name.as_str() {
            FIND_POSTS_BY_CATEGORY => {
                let args = decode_args(&find_posts_declaration(), &call.args)?;
                Ok(ToolCall::FindPostsByCategory {
                    id: call.id.clone(),
                    args,
                })
            }
            other => Err(BridgeError::UnsupportedFunction {
                name: other.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::FindPostsByCategory { .. } => FIND_POSTS_BY_CATEGORY,
        }
    }

    /// Runs the call and wraps its result for the model.
    pub fn execute(&self) -> BridgeResult<FunctionResponse> {
        let (id, response) = match self {
            ToolCall::FindPostsByCategory { id, args } => {
                (id.clone(), to_payload(&find_posts_by_category(args))?)
            }
        };
        Ok(FunctionResponse {
            id,
            name: self.name().to_string(),
            response,
        })
    }
}

fn decode_args<T>(declaration: &FunctionDeclaration, args: &Value) -> BridgeResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    let invalid = |reason: String| BridgeError::InvalidArguments {
        name: declaration.name.clone(),
        reason,
    };
    if let Some(schema) = &declaration.parameters {
        schema
            .validate(args)
            .map_err(|violation| invalid(violation.to_string()))?;
    }
    serde_json::from_value(args.clone()).map_err(|err| invalid(err.to_string()))
}

fn to_payload<T: Serialize>(value: &T) -> BridgeResult<Value> {
    serde_json::to_value(value)
        .map_err(|err| internal_error(format!("failed to encode function response: {err}")).into())
}
