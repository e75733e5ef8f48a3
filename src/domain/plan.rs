use std::fmt;

/// Where a plan's text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanSource {
    HostedModel { model: String },
    LocalTool { form: String },
    /// Fixed example text used only by dry runs when no local tool is reachable.
    Example,
}

impl fmt::Display for PlanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanSource::HostedModel { model } => write!(f, "hosted model {model}"),
            PlanSource::LocalTool { form } => write!(f, "local tool ({form})"),
            PlanSource::Example => f.write_str("example plan"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub text: String,
    pub source: PlanSource,
}

impl Plan {
    pub fn new(text: impl Into<String>, source: PlanSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    pub fn example() -> Self {
        Self::new(EXAMPLE_PLAN, PlanSource::Example)
    }

    pub fn is_example(&self) -> bool {
        self.source == PlanSource::Example
    }
}

pub const EXAMPLE_PLAN: &str = r#"
# Implementation Plan for User Authentication Feature

## Summary
This feature requires implementing OAuth2-based user authentication that allows users to log in using their Google or GitHub accounts, manage their sessions, and log out securely. We'll need to build authentication flows, user session management, and integrate with OAuth2 providers.

## Implementation Plan

### 1. Set Up OAuth2 Provider Integrations
- Register application with Google OAuth2 and GitHub OAuth2 services
- Store client IDs and secrets securely in environment variables
- Create OAuth2 configuration module to manage provider settings

### 2. Create Authentication Backend
- Implement OAuth2 authorization endpoints
- Create callback handlers for OAuth providers
- Develop token validation and refresh mechanisms
- Implement secure session management
- Create logout functionality

### 3. Build User Management System
- Design user model that stores OAuth provider information
- Implement user profile retrieval from OAuth providers
- Create mechanisms to link accounts from multiple providers

### 4. Develop Frontend Components
- Build login page with OAuth provider buttons
- Create user profile component
- Implement secure session storage in frontend
- Add authentication state management
- Build logout functionality

### 5. Add Authorization System
- Implement role-based access control
- Create protected route mechanisms
- Add authorization middleware

## File Changes

### Backend Files
- `/config/auth.js` - New file for auth configuration
- `/models/User.js` - New user model file
- `/controllers/authController.js` - New controller for auth endpoints
- `/routes/auth.js` - New routes for authentication
- `/middleware/auth.js` - New middleware for authentication
- `/services/tokenService.js` - New service for token management

### Frontend Files
- `/src/components/Login.jsx` - New login component
- `/src/components/Profile.jsx` - New profile component
- `/src/context/AuthContext.jsx` - New auth context for state management
- `/src/services/auth.js` - New auth service for API calls
- `/src/hooks/useAuth.js` - New custom hook for auth state
- `/src/routes/ProtectedRoute.jsx` - New component for route protection

## Technical Considerations

### Security Implications
- Implement CSRF protection for auth endpoints
- Use HTTPS for all communication
- Store tokens securely, preferably in HTTP-only cookies
- Implement proper OAuth state parameter validation
- Set secure and SameSite attributes for cookies
- Consider rate limiting on auth endpoints to prevent brute force

### Performance Considerations
- Optimize token validation to minimize database queries
- Consider caching user permissions
- Implement efficient session revocation mechanism

### Edge Cases
- Handle account merging when same user authenticates with different providers
- Manage expired/invalid tokens gracefully
- Handle OAuth provider downtime
- Consider user role changes during active sessions

### Testing Approach
- Unit tests for authentication logic and controllers
- Integration tests for OAuth flows using provider test accounts
- E2E tests for complete login/logout flows
- Security testing including penetration testing
- Test cases for invalid/expired tokens and session management
"#;
