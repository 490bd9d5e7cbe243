// All LLM prompt templates for the career pathing pipeline.
// Placeholders are `{name}`, filled in a single pass by `pipeline::fill_template`.
// `{json_only}` is always llm_client::prompts::JSON_ONLY_INSTRUCTION.

/// Profile analysis prompt.
/// Replace: {organization}, {name}, {current_role}, {department}, {career_level},
///          {skills}, {certifications}, {interests}, {aspirations}, {json_only}
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the following employee profile for {organization} and extract key skills, certifications, interests, and career aspirations.
Profile:
Name: {name}
Current Role: {current_role}
Department: {department}
Career Level: {career_level}
Skills Text: {skills}
Certifications Text: {certifications}
Interests Text: {interests}
Aspirations Text: {aspirations}

Return a JSON object with exactly two keys:
1. "extractedSkills": an array of strings, listing unique skills and certifications.
2. "extractedAspirations": an array of strings, summarizing key career goals or desired future roles.
Be concise and focus on actionable items. If a section is empty, return an empty array for the corresponding key.
Example: {"extractedSkills": ["Python", "Machine Learning", "AWS Certified Cloud Practitioner"], "extractedAspirations": ["Lead AI projects", "Specialize in NLP"]}

{json_only}"#;

/// Career path recommendation prompt.
/// Replace: {organization}, {roles_json}, {name}, {current_role}, {skills}, {interests},
///          {aspirations}, {extracted_skills}, {extracted_aspirations}, {json_only}
pub const RECOMMENDATION_PROMPT_TEMPLATE: &str = r#"You are an expert HR career advisor for {organization}.
The organization values innovation, continuous learning, and internal growth.
Here is a simplified list of roles available at {organization} and their typical skill sets:
{roles_json}

Given the following employee profile:
Name: {name}
Current Role: {current_role}
Stated Skills/Certs: {skills}
Stated Interests: {interests}
Stated Aspirations: {aspirations}
AI Extracted Skills: {extracted_skills}
AI Extracted Aspirations: {extracted_aspirations}

Recommend 2-3 ideal career paths within {organization} for this employee.
For each path, provide:
1. "id": A unique string identifier for this path.
2. "title": The job title (one of the listed role titles or a logical progression).
3. "description": A concise and motivating 2-3 sentence summary of the role and why it might be a good fit for this employee.
4. "requiredSkills": An array of 5-7 key skills needed for this role.
5. "skillsToDevelop": An array of 3-5 skills from "requiredSkills" that the employee likely needs to develop or strengthen.
6. "estimatedTimeToReach": A realistic timeframe (e.g., "6-12 months", "1-2 years", "2-3 years").
7. "matchScore": An integer from 0 to 100 estimating how well the current profile aligns with this path. Be realistic.
8. "growthPotential": One of "High", "Medium", "Low".
9. "interestAlignment": One of "High", "Medium", "Low", based on stated interests and aspirations.

Return a JSON array of objects, one per career path.

{json_only}"#;

/// Development plan prompt.
/// Replace: {organization}, {name}, {title}, {required_skills}, {skills_to_develop},
///          {current_skills}, {json_only}
pub const PLAN_PROMPT_TEMPLATE: &str = r#"You are a career development advisor at {organization}.
For an employee named {name}, aiming for the role of "{title}", which generally requires skills like [{required_skills}] and specifically needs to develop [{skills_to_develop}], suggest a personalized development plan.
The employee's current stated skills are: [{current_skills}].

Include 2-3 actionable steps. For each step, provide:
1. "id": A unique string identifier for this action.
2. "actionType": One of "Training", "Mentorship", "Project Assignment", "Shadowing", "Certification".
3. "description": A brief explanation of the action, tailored to {organization}'s context if possible.
4. "suggestedResource": A specific, practical resource (e.g., "Internal L&D Portal: Course XYZ", "Seek mentorship from a Senior {title}", "Coursera: XYZ Specialization").
5. "estimatedEffort": e.g., "2-4 weeks", "Ongoing (1-2 hours/week)", "3 months part-time".

Focus on practical and impactful suggestions.
Return a JSON array of development action objects.

{json_only}"#;
