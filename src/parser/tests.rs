//! Tests for the HTTP parser.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use serde::{Deserialize, Serialize};
    use tokio::io::{AsyncReadExt, BufReader};

    use crate::parser::{
        parse_request, read_request, read_request_line, split_target, Error, Request, RequestLine,
    };

    #[tokio::test]
    async fn test_parse_simple_get_request() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).await.unwrap();
        assert_eq!(result.method, "GET");
        assert_eq!(result.resource, "/index.html");
        assert_eq!(result.version, "HTTP/1.1");
        assert_eq!(result.headers.get("Host").unwrap(), "example.com");
        assert!(result.query_params.is_empty());
        assert!(result.body.is_empty());
    }

    #[tokio::test]
    async fn test_parse_request_with_multiple_headers() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test\r\nAccept: */*\r\n\r\n";
        let result = parse_request(request).await.unwrap();
        assert_eq!(result.headers.len(), 3);
        assert_eq!(result.headers.get("User-Agent").unwrap(), "test");
        assert_eq!(result.headers.get("Accept").unwrap(), "*/*");
    }

    #[tokio::test]
    async fn test_method_is_not_validated() {
        let request = b"BREW /pot HTTP/1.1\r\n\r\n";
        let result = parse_request(request).await.unwrap();
        assert_eq!(result.method, "BREW");
    }

    #[tokio::test]
    async fn test_version_is_echoed() {
        let request = b"GET / HTTP/0.9\r\n\r\n";
        let result = parse_request(request).await.unwrap();
        assert_eq!(result.version, "HTTP/0.9");
    }

    #[tokio::test]
    async fn test_case_insensitive_headers() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).await.unwrap();
        assert!(result.has_header("host"));
        assert!(result.has_header("HOST"));
        assert!(result.has_header("Host"));
    }

    #[tokio::test]
    async fn test_empty_request() {
        let result = parse_request(b"").await;
        assert!(matches!(result, Err(Error::EmptyRequest)));
    }

    #[tokio::test]
    async fn test_blank_first_line_is_no_request() {
        let mut input: &[u8] = b"\r\n";
        let line = read_request_line(&mut input).await.unwrap();
        assert!(line.is_none());
    }

    #[tokio::test]
    async fn test_malformed_request_line() {
        let result = parse_request(b"BADLINE\r\n\r\n").await;
        assert!(matches!(result, Err(Error::MalformedRequestLine(ref l)) if l == "BADLINE"));
    }

    #[tokio::test]
    async fn test_request_line_with_extra_whitespace() {
        // Tokens are split on single spaces, so a double space yields four tokens
        let request = b"GET  /index.html HTTP/1.1\r\n\r\n";
        let result = parse_request(request).await;
        assert!(matches!(result, Err(Error::MalformedRequestLine(_))));
    }

    #[tokio::test]
    async fn test_request_line_with_too_many_tokens() {
        let result = parse_request(b"GET / HTTP/1.1 extra\r\n\r\n").await;
        assert!(matches!(result, Err(Error::MalformedRequestLine(_))));
    }

    #[tokio::test]
    async fn test_request_line_with_trailing_space() {
        let result = parse_request(b"GET /index.html HTTP/1.1 \r\n\r\n").await.unwrap();
        assert_eq!(result.resource, "/index.html");
        assert_eq!(result.version, "HTTP/1.1");

        // Leading and inner empty tokens still count
        let result = parse_request(b" GET / HTTP/1.1\r\n\r\n").await;
        assert!(matches!(result, Err(Error::MalformedRequestLine(_))));
    }

    #[test]
    fn test_request_line_parse() {
        let line = RequestLine::parse("POST /submit?x=1 HTTP/1.0").unwrap();
        assert_eq!(
            line,
            RequestLine {
                method: "POST".to_string(),
                target: "/submit?x=1".to_string(),
                version: "HTTP/1.0".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_header_format() {
        let request = b"GET /index.html HTTP/1.1\r\nInvalidHeader\r\n\r\n";
        let result = parse_request(request).await;
        assert!(matches!(result, Err(Error::InvalidHeaderFormat(ref h)) if h == "InvalidHeader"));
    }

    #[tokio::test]
    async fn test_header_name_with_illegal_characters() {
        let request = b"GET / HTTP/1.1\r\nX_Under: value\r\n\r\n";
        let result = parse_request(request).await;
        assert!(matches!(result, Err(Error::InvalidHeaderFormat(_))));
    }

    #[tokio::test]
    async fn test_header_without_value() {
        let request = b"GET / HTTP/1.1\r\nX-Empty:\r\n\r\n";
        let result = parse_request(request).await;
        assert!(matches!(result, Err(Error::InvalidHeaderFormat(_))));
    }

    #[tokio::test]
    async fn test_headers_with_multiple_colons() {
        let request = b"GET /index.html HTTP/1.1\r\nX-Test: value:with:colons\r\n\r\n";
        let result = parse_request(request).await.unwrap();
        assert_eq!(result.headers.get("X-Test").unwrap(), "value:with:colons");
    }

    #[tokio::test]
    async fn test_headers_are_trimmed() {
        let request = b"GET /index.html HTTP/1.1\r\nHost:   example.com  \r\nUser-Agent:test\r\n\r\n";
        let result = parse_request(request).await.unwrap();
        assert_eq!(result.headers.get("Host").unwrap(), "example.com");
        assert_eq!(result.headers.get("User-Agent").unwrap(), "test");
    }

    #[tokio::test]
    async fn test_duplicate_headers() {
        let request = b"GET /index.html HTTP/1.1\r\nX-Test: value1\r\nX-Test: value2\r\n\r\n";
        let result = parse_request(request).await.unwrap();
        // The last occurrence wins
        assert_eq!(result.headers.get("X-Test").unwrap(), "value2");
    }

    #[tokio::test]
    async fn test_duplicate_headers_differing_in_case() {
        let request = b"GET / HTTP/1.1\r\nX-Test: value1\r\nx-test: value2\r\n\r\n";
        let result = parse_request(request).await.unwrap();
        assert_eq!(result.headers.len(), 1);
        assert_eq!(result.get_header("X-Test").unwrap(), "value2");
        assert_eq!(result.headers.get("x-test").unwrap(), "value2");
    }

    #[tokio::test]
    async fn test_last_content_length_wins_regardless_of_case() {
        for _ in 0..50 {
            let mut input: &[u8] =
                b"POST / HTTP/1.1\r\nContent-Length: 5\r\ncontent-length: 2\r\n\r\nhello";
            let line = read_request_line(&mut input).await.unwrap().unwrap();
            let result = read_request(&mut input, line).await.unwrap();
            assert_eq!(result.body, b"he");
            assert_eq!(input, b"llo");
        }
    }

    #[tokio::test]
    async fn test_mixed_line_endings() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\nUser-Agent: test\r\n\n";
        let result = parse_request(request).await.unwrap();
        assert_eq!(result.resource, "/index.html");
        assert_eq!(result.headers.get("Host").unwrap(), "example.com");
        assert_eq!(result.headers.get("User-Agent").unwrap(), "test");
    }

    #[tokio::test]
    async fn test_headers_until_end_of_stream() {
        let request = b"GET / HTTP/1.1\r\nHost: example.com\r\n";
        let result = parse_request(request).await.unwrap();
        assert_eq!(result.headers.get("Host").unwrap(), "example.com");
    }

    #[tokio::test]
    async fn test_query_decoding() {
        let request = b"GET /search?q=a+b&x=1 HTTP/1.1\r\n\r\n";
        let result = parse_request(request).await.unwrap();
        assert_eq!(result.resource, "/search");
        assert_eq!(result.query_params.len(), 2);
        assert_eq!(result.get_query_param("q").unwrap(), "a b");
        assert_eq!(result.get_query_param("x").unwrap(), "1");
        assert!(result.has_query_param("x"));
        assert!(!result.has_query_param("y"));
    }

    #[tokio::test]
    async fn test_query_is_not_percent_decoded() {
        let request = b"GET /search?q=test%20query&filter=name:john HTTP/1.1\r\n\r\n";
        let result = parse_request(request).await.unwrap();
        assert_eq!(result.get_query_param("q").unwrap(), "test%20query");
        assert_eq!(result.get_query_param("filter").unwrap(), "name:john");
    }

    #[tokio::test]
    async fn test_trailing_question_mark_is_stripped() {
        let result = parse_request(b"GET /page? HTTP/1.1\r\n\r\n").await.unwrap();
        assert_eq!(result.resource, "/page");
        assert!(result.query_params.is_empty());
    }

    #[tokio::test]
    async fn test_query_parameter_without_equals() {
        let request = b"GET /search?q=test&flag HTTP/1.1\r\n\r\n";
        let result = parse_request(request).await;
        assert!(matches!(result, Err(Error::InvalidQueryParameter(ref p)) if p == "flag"));
    }

    #[tokio::test]
    async fn test_trailing_ampersand_is_ignored() {
        let result = parse_request(b"GET /a?b=1& HTTP/1.1\r\n\r\n").await.unwrap();
        assert_eq!(result.resource, "/a");
        assert_eq!(result.query_params.len(), 1);
        assert_eq!(result.get_query_param("b").unwrap(), "1");

        let (resource, params) = split_target("/a?&&").unwrap();
        assert_eq!(resource, "/a");
        assert!(params.is_empty());

        // An empty pair in the middle is still malformed
        let result = parse_request(b"GET /a?b=1&&c=2 HTTP/1.1\r\n\r\n").await;
        assert!(matches!(result, Err(Error::InvalidQueryParameter(ref p)) if p.is_empty()));
    }

    #[test]
    fn test_split_target() {
        let (resource, params) = split_target("/a+b?k+1=v+2&empty=").unwrap();
        // Only the query component is decoded
        assert_eq!(resource, "/a+b");
        assert_eq!(params.get("k 1").unwrap(), "v 2");
        assert_eq!(params.get("empty").unwrap(), "");

        let (resource, params) = split_target("/plain").unwrap();
        assert_eq!(resource, "/plain");
        assert!(params.is_empty());
    }

    #[tokio::test]
    async fn test_resource_must_be_absolute() {
        let result = parse_request(b"GET index.html HTTP/1.1\r\n\r\n").await;
        assert!(matches!(result, Err(Error::InvalidPath(ref p)) if p == "index.html"));

        let result = parse_request(b"GET ?q=1 HTTP/1.1\r\n\r\n").await;
        assert!(matches!(result, Err(Error::InvalidPath(ref p)) if p.is_empty()));
    }

    #[tokio::test]
    async fn test_content_length_exactness() {
        let mut input: &[u8] = b"POST /upload HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello world";
        let line = read_request_line(&mut input).await.unwrap().unwrap();
        let result = read_request(&mut input, line).await.unwrap();
        assert_eq!(result.body, b"hello");
        // The remaining bytes are left untouched in the stream
        assert_eq!(input, b" world");
    }

    #[tokio::test]
    async fn test_body_preserves_raw_bytes() {
        let request = b"POST / HTTP/1.1\r\nContent-Length: 4\r\n\r\n\xFF\x00\r\n";
        let result = parse_request(request).await.unwrap();
        assert_eq!(result.body, vec![0xFF, 0x00, b'\r', b'\n']);
    }

    #[tokio::test]
    async fn test_body_with_newlines() {
        let body = "this is some testbody\nAND another line";
        let request = format!(
            "POST / HTTP/1.1\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        let result = parse_request(request.as_bytes()).await.unwrap();
        assert_eq!(result.body_text(), body);
    }

    #[tokio::test]
    async fn test_content_length_header_is_case_insensitive() {
        let request = b"POST / HTTP/1.1\r\ncontent-length: 2\r\n\r\nabc";
        let result = parse_request(request).await.unwrap();
        assert_eq!(result.body, b"ab");
    }

    #[tokio::test]
    async fn test_no_content_length_means_empty_body() {
        let request = b"POST / HTTP/1.1\r\nHost: example.com\r\n\r\nignored";
        let result = parse_request(request).await.unwrap();
        assert!(result.body.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_content_length() {
        for value in ["abc", "-1", "1.5", "99999999999999999999999"] {
            let request = format!("POST / HTTP/1.1\r\nContent-Length: {value}\r\n\r\n");
            let result = parse_request(request.as_bytes()).await;
            assert!(
                matches!(result, Err(Error::InvalidContentLength(ref v)) if v == value),
                "expected {value} to be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_truncated_body() {
        let request = b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nshort";
        let result = parse_request(request).await;
        assert!(matches!(result, Err(Error::Io(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof));
    }

    #[tokio::test]
    async fn test_body_larger_than_read_buffer() {
        let body = vec![b'x'; 64 * 1024];
        let mut raw = format!("PUT /blob HTTP/1.1\r\nContent-Length: {}\r\n\r\n", body.len()).into_bytes();
        raw.extend_from_slice(&body);
        raw.extend_from_slice(b"trailing");

        let mut reader = BufReader::with_capacity(512, raw.as_slice());
        let line = read_request_line(&mut reader).await.unwrap().unwrap();
        let result = read_request(&mut reader, line).await.unwrap();
        assert_eq!(result.body.len(), body.len());

        let mut rest = String::new();
        reader.read_to_string(&mut rest).await.unwrap();
        assert_eq!(rest, "trailing");
    }

    #[test]
    fn test_bad_request_classification() {
        assert!(Error::MalformedRequestLine("x".to_string()).is_bad_request());
        assert!(Error::InvalidQueryParameter("x".to_string()).is_bad_request());
        assert!(!Error::EmptyRequest.is_bad_request());
        assert!(!Error::Io(std::io::ErrorKind::BrokenPipe.into()).is_bad_request());
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestUser {
        name: String,
        email: String,
    }

    #[test]
    fn test_request_accessors() {
        let mut headers = HashMap::new();
        headers.insert("Host".to_string(), "example.com".to_string());
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        let request = Request::new("GET", "/index.html", "HTTP/1.1", headers);

        assert_eq!(request.get_header("host").unwrap(), "example.com");
        assert_eq!(request.get_header("HOST").unwrap(), "example.com");
        assert!(request.get_header("X-Test").is_none());
        assert!(request.has_header("content-type"));
        assert!(!request.has_header("X-Test"));
        assert!(request.is_json());
    }

    #[test]
    fn test_json_parsing() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        let body = r#"{"name":"John Doe","email":"john@example.com"}"#;
        let request = Request::new("POST", "/api/users", "HTTP/1.1", headers.clone()).with_body(body);

        let user: TestUser = request.json().unwrap();
        assert_eq!(user.name, "John Doe");
        assert_eq!(user.email, "john@example.com");

        let invalid = Request::new("POST", "/api/users", "HTTP/1.1", headers)
            .with_body(r#"{"name":"John Doe","email":}"#);
        let result: Result<TestUser, _> = invalid.json();
        assert!(matches!(result, Err(Error::JsonError(_))));
    }

    #[tokio::test]
    async fn test_complex_request() {
        let request = b"POST /api/users?role=admin HTTP/1.1\r\n\
            Host: example.com\r\n\
            User-Agent: test-client/1.0\r\n\
            Content-Type: application/json\r\n\
            Content-Length: 46\r\n\
            X-API-Key: secret-key\r\n\
            \r\n\
            {\"name\":\"John Doe\",\"email\":\"john@example.com\"}";

        let result = parse_request(request).await.unwrap();
        assert_eq!(result.method, "POST");
        assert_eq!(result.resource, "/api/users");
        assert_eq!(result.headers.get("X-API-Key").unwrap(), "secret-key");
        assert_eq!(result.get_query_param("role").unwrap(), "admin");

        let user: TestUser = result.json().unwrap();
        assert_eq!(user.email, "john@example.com");
    }
}
