//! JSON schemas advertised to the model for each tool.

use serde_json::json;

use super::ToolKind;
use crate::ToolDefinition;

fn repo_properties() -> serde_json::Map<String, serde_json::Value> {
    let mut props = serde_json::Map::new();
    props.insert(
        "owner".into(),
        json!({ "type": "string", "description": "The owner or organization of the repository." }),
    );
    props.insert(
        "repo".into(),
        json!({ "type": "string", "description": "The name of the repository." }),
    );
    props
}

fn object_schema(extra: serde_json::Value, required: &[&str]) -> serde_json::Value {
    let mut props = repo_properties();
    if let serde_json::Value::Object(extra) = extra {
        props.extend(extra);
    }
    json!({
        "type": "object",
        "properties": props,
        "required": required,
    })
}

/// The schema advertised for `kind`.
pub fn definition(kind: ToolKind) -> ToolDefinition {
    let (description, parameters) = match kind {
        ToolKind::GetIssueDetails => (
            "Get detailed information about a specific issue from a GitHub repository.",
            object_schema(
                json!({
                    "issue_number": {
                        "type": "integer",
                        "description": "The number of the issue to retrieve."
                    }
                }),
                &["owner", "repo", "issue_number"],
            ),
        ),
        ToolKind::CreateBranch => (
            "Create a new branch in a GitHub repository.",
            object_schema(
                json!({
                    "branch_name": {
                        "type": "string",
                        "description": "The name for the new branch."
                    },
                    "source_branch": {
                        "type": "string",
                        "description": "The source branch to create from (defaults to 'main')."
                    }
                }),
                &["owner", "repo", "branch_name"],
            ),
        ),
        ToolKind::CreatePullRequest => (
            "Create a new pull request in a GitHub repository.",
            object_schema(
                json!({
                    "title": {
                        "type": "string",
                        "description": "The title of the pull request."
                    },
                    "body": {
                        "type": "string",
                        "description": "The body/description of the pull request."
                    },
                    "head": {
                        "type": "string",
                        "description": "The name of the branch where your changes are implemented (source branch)."
                    },
                    "base": {
                        "type": "string",
                        "description": "The name of the branch you want the changes pulled into (target branch, usually 'main' or 'master')."
                    },
                    "draft": {
                        "type": "boolean",
                        "description": "Whether to create the PR as a draft. Defaults to false."
                    }
                }),
                &["owner", "repo", "title", "head", "base"],
            ),
        ),
        ToolKind::GetRepositoryFiles => (
            "Get repository structure and file contents to understand the codebase.",
            object_schema(
                json!({
                    "path": {
                        "type": "string",
                        "description": "The path to explore (empty for root, or specific directory/file path)."
                    },
                    "ref": {
                        "type": "string",
                        "description": "The branch/commit reference (defaults to default branch)."
                    }
                }),
                &["owner", "repo"],
            ),
        ),
        ToolKind::UpdateFile => (
            "Create or update a file in a GitHub repository.",
            object_schema(
                json!({
                    "path": {
                        "type": "string",
                        "description": "The file path in the repository."
                    },
                    "content": {
                        "type": "string",
                        "description": "The full, updated file content (not just the diff). Always include the entire file."
                    },
                    "message": {
                        "type": "string",
                        "description": "The commit message for this change."
                    },
                    "branch": {
                        "type": "string",
                        "description": "The branch to commit to."
                    }
                }),
                &["owner", "repo", "path", "content", "message", "branch"],
            ),
        ),
    };

    ToolDefinition {
        name: kind.name().to_string(),
        description: description.to_string(),
        parameters,
    }
}

/// Convert a tool definition to the OpenAI `tools` array entry.
pub fn to_openai_tool(tool: &ToolDefinition) -> serde_json::Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_matching_object_schema() {
        for kind in ToolKind::ALL {
            let def = definition(kind);
            assert_eq!(def.name, kind.name());
            assert_eq!(def.parameters["type"], "object");
            assert!(def.parameters["properties"]["owner"].is_object());
            let required = def.parameters["required"].as_array().unwrap();
            assert!(required.iter().any(|r| r == "repo"));
        }
    }

    #[test]
    fn issue_number_is_an_integer() {
        let def = definition(ToolKind::GetIssueDetails);
        assert_eq!(def.parameters["properties"]["issue_number"]["type"], "integer");
    }

    #[test]
    fn openai_format_wraps_function() {
        let tool = to_openai_tool(&definition(ToolKind::UpdateFile));
        assert_eq!(tool["type"], "function");
        assert_eq!(tool["function"]["name"], "update_github_file");
        assert!(tool["function"]["parameters"]["properties"]["content"].is_object());
    }
}
