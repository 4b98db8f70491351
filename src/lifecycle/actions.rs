//! Concrete lifecycle actions: native build, image build, compose up/down.
//!
//! Each action composes an ordered list of output lines: informational
//! header lines, a one-line OK/failed summary, then the captured command
//! output. Failures stay inside the lines; actions never return errors.

use crate::exec;
use crate::fleet_config::IMAGE_FILE_NAME;
use crate::registry::Project;

/// Build the project's binary, then its container image when an image build
/// descriptor is present.
///
/// A project without a build command reports `Build Command undefined` and
/// spawns nothing. The two command outputs are concatenated, native build
/// first.
pub async fn build(project: &Project) -> Vec<String> {
    let mut lines = vec![
        format!("Building Project : {}", project.id),
        format!("Project DirPath : {}", project.dir.display()),
    ];

    let Some(command) = project.build_command.as_deref() else {
        lines.push("Build Command undefined".to_string());
        return lines;
    };
    lines.push(format!("Project BuildCommand : {}", command));

    let result = exec::run(&project.src_path(), command).await;
    if result.success {
        lines.push(format!("Build OK for {}", project.id));
    } else {
        lines.push(format!("Build failed : {}", result.outcome));
    }
    lines.extend(result.lines);

    let image_file = project.dir.join(IMAGE_FILE_NAME);
    if image_file.is_file() {
        let image_command = format!(
            "docker build -f {} -t {} {}",
            image_file.display(),
            project.image_name,
            project.dir.display()
        );
        lines.push(format!("Image BuildCommand : {}", image_command));

        let result = exec::run(&project.dir, &image_command).await;
        if result.success {
            lines.push(format!("Image build OK for {}", project.id));
        } else {
            lines.push(format!("Image build failed : {}", result.outcome));
        }
        lines.extend(result.lines);
    }

    lines
}

/// Bring the project's compose stack up, detached.
///
/// Runs in the project directory, where the orchestration descriptor lives.
pub async fn compose_up(project: &Project) -> Vec<String> {
    run_compose(project, "docker-compose up -d", "UP").await
}

/// Take the project's compose stack down.
pub async fn compose_down(project: &Project) -> Vec<String> {
    run_compose(project, "docker-compose down", "DOWN").await
}

async fn run_compose(project: &Project, command: &str, verb: &str) -> Vec<String> {
    let mut lines = vec![
        format!("Compose {} : {}", verb, project.id),
        format!("Project DirPath : {}", project.dir.display()),
    ];

    let result = exec::run(&project.dir, command).await;
    if result.success {
        lines.push(format!("Compose {} OK for {}", verb, project.id));
    } else {
        lines.push(format!("Compose {} failed : {}", verb, result.outcome));
    }
    lines.extend(result.lines);
    lines
}
