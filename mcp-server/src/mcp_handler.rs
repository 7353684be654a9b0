use anyhow::Result;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Write};
use std::sync::Arc;
use tracing::{error, info, warn};

use ticket_lib::CheckError;

use crate::use_cases::{TicketUseCase, WinningNumbersUseCase};

#[derive(Debug, serde::Deserialize)]
struct JsonRpcRequest {
    #[serde(default = "default_jsonrpc")]
    jsonrpc: String,
    method: String,
    params: Option<Value>,
    id: Option<Value>,
}

fn default_jsonrpc() -> String {
    "2.0".to_string()
}

#[derive(Debug, serde::Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
    id: Option<Value>,
}

impl JsonRpcResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id: Some(id.unwrap_or(json!(1))),
        }
    }

    fn failure(id: Option<Value>, code: i32, message: String, data: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data,
            }),
            id: Some(id.unwrap_or(json!(1))),
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

#[derive(Debug, serde::Serialize)]
struct Tool {
    name: String,
    description: String,
    #[serde(rename = "inputSchema")]
    input_schema: Value,
}

pub struct MCPHandler {
    ticket_use_case: Arc<TicketUseCase>,
    winning_use_case: Arc<WinningNumbersUseCase>,
}

impl MCPHandler {
    pub fn new(
        ticket_use_case: Arc<TicketUseCase>,
        winning_use_case: Arc<WinningNumbersUseCase>,
    ) -> Self {
        Self {
            ticket_use_case,
            winning_use_case,
        }
    }

    pub async fn serve<R, W>(self, reader: R, mut writer: W) -> Result<()>
    where
        R: BufRead,
        W: Write,
    {
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str::<JsonRpcRequest>(&line) {
                Ok(req) => req,
                Err(e) => {
                    warn!("Failed to parse request: {} - Line: {}", e, line);
                    let error_response = JsonRpcResponse {
                        jsonrpc: "2.0".to_string(),
                        result: None,
                        error: Some(JsonRpcError {
                            code: -32700,
                            message: "Parse error".to_string(),
                            data: Some(json!(e.to_string())),
                        }),
                        id: None,
                    };
                    writeln!(writer, "{}", serde_json::to_string(&error_response)?)?;
                    writer.flush()?;
                    continue;
                }
            };

            // Notifications never get a response.
            if request.id.is_none() || request.method.starts_with("notifications/") {
                if request.method == "notifications/initialized" {
                    info!("🎟️ Client initialized");
                }
                continue;
            }

            let response = self.handle_request(request).await;
            writeln!(writer, "{}", serde_json::to_string(&response)?)?;
            writer.flush()?;
        }

        Ok(())
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "tools/list" => self.handle_list_tools(request.id),
            "tools/call" => self.handle_call_tool(request.params, request.id).await,
            _ => JsonRpcResponse::failure(
                request.id,
                -32601,
                format!("Method not found: {}", request.method),
                None,
            ),
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("🎟️ Initializing ticket MCP server");
        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "ticket-mcp-server",
                    "version": "0.1.0"
                }
            }),
        )
    }

    fn handle_list_tools(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(id, json!({ "tools": get_tools() }))
    }

    async fn handle_call_tool(&self, params: Option<Value>, id: Option<Value>) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::failure(id, -32602, "Missing params".to_string(), None);
        };

        let Some(tool_name) = params.get("name").and_then(|n| n.as_str()) else {
            return JsonRpcResponse::failure(id, -32602, "Missing tool name".to_string(), None);
        };

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));
        let arguments_map: HashMap<String, Value> =
            serde_json::from_value(arguments).unwrap_or_default();

        match self.execute_tool(tool_name, &arguments_map).await {
            Ok(content) => JsonRpcResponse::success(
                id,
                json!({
                    "content": [
                        {
                            "type": "text",
                            "text": content
                        }
                    ]
                }),
            ),
            Err(e) => {
                let check_error = e.downcast_ref::<CheckError>();
                match check_error {
                    Some(err) if err.is_user_correctable() => {
                        warn!(tool = tool_name, "{}", err);
                    }
                    // The client only sees the top-level message.
                    _ => error!(tool = tool_name, error = ?e, "tool call failed"),
                }

                // Check failures carry their HTTP-style status for the client.
                let data = check_error.map(|err| json!({ "status": err.status_code() }));
                JsonRpcResponse::failure(id, -32603, format!("Tool execution error: {}", e), data)
            }
        }
    }

    async fn execute_tool(
        &self,
        tool_name: &str,
        arguments: &HashMap<String, Value>,
    ) -> Result<String> {
        let tickets = &self.ticket_use_case;
        let winning = &self.winning_use_case;
        match tool_name {
            "upload_image_ticket" => tickets.upload_image_ticket(arguments).await,
            "check_ticket_text" => tickets.check_ticket_text(arguments).await,
            "get_ticket_history" => tickets.get_ticket_history(arguments).await,
            "get_winning_numbers" => winning.get_winning_numbers(arguments).await,
            "insert_winning_numbers" => winning.insert_winning_numbers(arguments).await,
            "fetch_winning_numbers" => winning.fetch_winning_numbers(arguments).await,
            _ => Err(anyhow::anyhow!("Unknown tool: {}", tool_name)),
        }
    }
}

fn get_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "upload_image_ticket".to_string(),
            description: "Save a ticket image, read it with OCR and check it against the draw results".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "image_path": {
                        "type": "string",
                        "description": "Path to the ticket image (png, jpg, jpeg, bmp, tif, tiff, webp, gif)"
                    },
                    "is_system_bet": {
                        "type": "boolean",
                        "description": "Treat a TOTO ticket as a system bet covering every 6-number combination"
                    }
                },
                "required": ["image_path"]
            }),
        },
        Tool {
            name: "check_ticket_text".to_string(),
            description: "Check already recognized ticket text against the draw results".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "raw_text": {
                        "type": "string",
                        "description": "Text read from the ticket"
                    },
                    "is_system_bet": {
                        "type": "boolean",
                        "description": "Treat a TOTO ticket as a system bet covering every 6-number combination"
                    }
                },
                "required": ["raw_text"]
            }),
        },
        Tool {
            name: "get_ticket_history".to_string(),
            description: "List saved ticket checks, newest first".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        Tool {
            name: "get_winning_numbers".to_string(),
            description: "Look up the winning numbers for a game and draw date".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "game_type": {
                        "type": "string",
                        "enum": ["TOTO", "4D"]
                    },
                    "draw_date": {
                        "type": "string",
                        "description": "Draw date in YYYY-MM-DD format"
                    }
                },
                "required": ["game_type", "draw_date"]
            }),
        },
        Tool {
            name: "insert_winning_numbers".to_string(),
            description: "Parse a raw JSON draw result and save it to the database".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "raw_json": {
                        "type": "string",
                        "description": "JSON object with game_type, draw_date and winning_numbers"
                    }
                },
                "required": ["raw_json"]
            }),
        },
        Tool {
            name: "fetch_winning_numbers".to_string(),
            description: "Fetch draw results from the results feed for several dates and save the new ones".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "game_type": {
                        "type": "string",
                        "enum": ["TOTO", "4D"]
                    },
                    "dates": {
                        "type": "array",
                        "description": "Draw dates in YYYY-MM-DD format",
                        "items": {"type": "string"}
                    }
                },
                "required": ["game_type", "dates"]
            }),
        },
    ]
}

pub fn stdio() -> (BufReader<io::Stdin>, io::Stdout) {
    (BufReader::new(io::stdin()), io::stdout())
}
